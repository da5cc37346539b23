//! 文本行到形状的解析。
//!
//! 行格式（字段以空白分隔）：
//! - 矩形：`id x1 y1 x2 y2 x3 y3 x4 y4`，顶点按环绕顺序给出
//! - 立方体：`id x y z side`，基点为最小角

use once_cell::sync::Lazy;
use regex::Regex;
use shapes_core::entities::{Cube, Rectangle};
use shapes_core::geometry::{Point2, Point3};
use shapes_core::shape::Shape;
use shapes_core::validators;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("invalid {kind} data format: {line}")]
    Format { kind: &'static str, line: String },
    #[error("{kind} field {field} is not a finite number")]
    NonFinite {
        kind: &'static str,
        field: &'static str,
    },
    #[error("invalid {kind} {id}: {reason}")]
    Invalid {
        kind: &'static str,
        id: String,
        reason: String,
    },
}

pub trait ShapeParser {
    type Shape;

    /// 形状种类名称，用于日志与错误信息。
    const KIND: &'static str;

    fn parse(&self, line: &str) -> Result<Self::Shape, ParseError>;

    /// 几何合法性检查，在解析成功之后执行。
    fn validate(&self, shape: &Self::Shape) -> Result<(), ParseError>;
}

const NUMBER: &str = r"[-+]?[0-9]*\.?[0-9]+";

fn line_pattern(fields: usize) -> String {
    let mut pattern = String::from(r"^([A-Za-z0-9_]+)");
    for _ in 0..fields {
        pattern.push_str(r"\s+(");
        pattern.push_str(NUMBER);
        pattern.push(')');
    }
    pattern.push('$');
    pattern
}

static RECTANGLE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&line_pattern(8)).expect("矩形行正则应当合法"));

static CUBE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&line_pattern(4)).expect("立方体行正则应当合法"));

/// 按正则拆出标识与 N 个数值字段。
fn capture_fields<const N: usize>(
    regex: &Regex,
    kind: &'static str,
    names: [&'static str; N],
    line: &str,
) -> Result<(String, [f64; N]), ParseError> {
    let line = line.trim();
    let format_error = || ParseError::Format {
        kind,
        line: line.to_string(),
    };
    let captures = regex.captures(line).ok_or_else(format_error)?;

    let mut values = [0.0; N];
    for (index, name) in names.into_iter().enumerate() {
        let raw = captures.get(index + 2).ok_or_else(format_error)?.as_str();
        let value: f64 = raw.parse().map_err(|_| format_error())?;
        if !value.is_finite() {
            return Err(ParseError::NonFinite { kind, field: name });
        }
        values[index] = value;
    }
    Ok((captures[1].to_string(), values))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RectangleParser;

impl ShapeParser for RectangleParser {
    type Shape = Rectangle;
    const KIND: &'static str = Rectangle::KIND;

    fn parse(&self, line: &str) -> Result<Rectangle, ParseError> {
        let (id, [x1, y1, x2, y2, x3, y3, x4, y4]) = capture_fields(
            &RECTANGLE_LINE,
            Self::KIND,
            ["x1", "y1", "x2", "y2", "x3", "y3", "x4", "y4"],
            line,
        )?;
        Ok(Rectangle::new(
            id,
            [
                Point2::new(x1, y1),
                Point2::new(x2, y2),
                Point2::new(x3, y3),
                Point2::new(x4, y4),
            ],
        ))
    }

    fn validate(&self, rectangle: &Rectangle) -> Result<(), ParseError> {
        if validators::rectangle::is_valid(rectangle) {
            return Ok(());
        }
        Err(ParseError::Invalid {
            kind: Self::KIND,
            id: rectangle.id().to_string(),
            reason: "corners do not form a convex quadrilateral with parallel opposite sides"
                .to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CubeParser;

impl ShapeParser for CubeParser {
    type Shape = Cube;
    const KIND: &'static str = Cube::KIND;

    fn parse(&self, line: &str) -> Result<Cube, ParseError> {
        let (id, [x, y, z, side]) =
            capture_fields(&CUBE_LINE, Self::KIND, ["x", "y", "z", "side"], line)?;
        if side <= 0.0 {
            return Err(ParseError::Invalid {
                kind: Self::KIND,
                id,
                reason: format!("side length must be positive, got {side}"),
            });
        }
        Ok(Cube::new(id, Point3::new(x, y, z), side))
    }

    fn validate(&self, cube: &Cube) -> Result<(), ParseError> {
        if validators::cube::is_valid(cube) {
            return Ok(());
        }
        Err(ParseError::Invalid {
            kind: Self::KIND,
            id: cube.id().to_string(),
            reason: "cube has a non-finite base point or non-positive side".to_string(),
        })
    }
}
