use std::path::PathBuf;

use garden_gslh::GslhError;

/// GSL 源码中的错误
///
/// `line` 为 -1 表示错误不属于某一行（例如不同 stage 之间的不一致）。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}.{}", location_suffix(.line.clone(), .word.as_deref()))]
pub struct CompileError {
    pub message: String,
    pub line: i32,
    pub word: Option<String>,
}
impl CompileError {
    pub fn new(message: impl Into<String>, line: i32, word: Option<&str>) -> Self {
        Self {
            message: message.into(),
            line,
            word: word.map(str::to_string),
        }
    }

    /// 没有行号信息的错误
    pub fn family(message: impl Into<String>) -> Self {
        Self::new(message, -1, None)
    }
}

fn location_suffix(line: i32, word: Option<&str>) -> String {
    match (line, word) {
        (-1, None) => String::new(),
        (-1, Some(word)) => format!(" (word: {word})"),
        (line, None) => format!(" (line: {line})"),
        (line, Some(word)) => format!(" (line: {line}, word: {word})"),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GslError {
    #[error("{}: {}", .path.display(), .source)]
    Compile { path: PathBuf, source: CompileError },
    /// glslc 的诊断信息已经输出到日志，调用方不需要再次打印
    #[error("glslc failed to compile {}", .0.display())]
    Glslc(PathBuf),
    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Header(#[from] GslhError),
}
impl GslError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn compile(path: impl Into<PathBuf>, source: CompileError) -> Self {
        Self::Compile {
            path: path.into(),
            source,
        }
    }

    /// 编译错误的详细信息
    pub fn as_compile_error(&self) -> Option<&CompileError> {
        match self {
            Self::Compile { source, .. } => Some(source),
            _ => None,
        }
    }
}
