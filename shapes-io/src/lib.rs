use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

pub mod parsers;

pub use parsers::{CubeParser, ParseError, RectangleParser, ShapeParser};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 数据文件中的一行有效内容，保留原始行号（从 1 开始）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLine {
    pub number: usize,
    pub text: String,
}

/// 读取数据文件，去除首尾空白，跳过空行与 `#` 注释行。
pub fn read_data_lines(path: impl AsRef<Path>) -> Result<Vec<DataLine>, IoError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| IoError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(data_lines(&content))
}

pub fn data_lines(content: &str) -> Vec<DataLine> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, text)| DataLine {
            number,
            text: text.to_string(),
        })
        .collect()
}

/// 被拒绝的数据行及原因。
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub line: DataLine,
    pub error: ParseError,
}

/// 一次加载的结果：成功构造的形状与被拒绝的行，均保持文件顺序。
#[derive(Debug)]
pub struct LoadReport<T> {
    pub shapes: Vec<T>,
    pub rejected: Vec<Rejection>,
}

impl<T> LoadReport<T> {
    #[inline]
    pub fn accepted_count(&self) -> usize {
        self.shapes.len()
    }

    #[inline]
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

impl<T> Default for LoadReport<T> {
    fn default() -> Self {
        Self {
            shapes: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// 逐行解析并校验数据文件。单行失败只记录在报告里，不会中断加载。
#[derive(Debug, Clone, Default)]
pub struct ShapeFileLoader<P> {
    parser: P,
}

impl<P: ShapeParser> ShapeFileLoader<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadReport<P::Shape>, IoError> {
        let path = path.as_ref();
        let lines = read_data_lines(path)?;
        let report = self.load_lines(lines);
        info!(
            path = %path.display(),
            kind = P::KIND,
            accepted = report.accepted_count(),
            rejected = report.rejected_count(),
            "数据文件加载完成"
        );
        Ok(report)
    }

    pub fn load_lines(&self, lines: impl IntoIterator<Item = DataLine>) -> LoadReport<P::Shape> {
        let mut report = LoadReport::default();
        for line in lines {
            let parsed = self
                .parser
                .parse(&line.text)
                .and_then(|shape| self.parser.validate(&shape).map(|()| shape));
            match parsed {
                Ok(shape) => report.shapes.push(shape),
                Err(error) => {
                    warn!(line = line.number, content = %line.text, error = %error, "数据行被拒绝");
                    report.rejected.push(Rejection { line, error });
                }
            }
        }
        report
    }
}
