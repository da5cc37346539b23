//! 加载数据文件、填充仓库并输出分析报告。

use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use shapes_core::calculators;
use shapes_core::entities::{Cube, Rectangle};
use shapes_core::geometry::CoordinatePlane;
use shapes_core::shape::{Shape, SharedShape};
use shapes_core::validators;
use shapes_engine::comparator::{ByCachedMetric, ByCoordinate, ById, ByKind};
use shapes_engine::repository::{InMemoryShapeRepository, ShapeRepository};
use shapes_engine::sort::{sort_shapes, sort_shapes_multi_key};
use shapes_engine::specification::{
    ByDistanceFromOrigin, ByMetricRange, ByQuadrant, Specification,
};
use shapes_engine::warehouse::Warehouse;
use shapes_io::{CubeParser, LoadReport, RectangleParser, ShapeFileLoader, ShapeParser};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub rectangles: PathBuf,
    pub cubes: PathBuf,
    pub quadrant: i32,
    pub recency_window: Duration,
}

/// 已入库的形状，同时保留具体类型以便调用各自的计算与校验函数。
struct Session {
    repository: InMemoryShapeRepository,
    warehouse: Rc<Warehouse>,
    rectangles: Vec<Rc<Rectangle>>,
    cubes: Vec<Rc<Cube>>,
}

impl Session {
    fn new(recency_window: Duration) -> Self {
        Self {
            repository: InMemoryShapeRepository::new(),
            warehouse: Warehouse::with_recency_window(recency_window),
            rectangles: Vec::new(),
            cubes: Vec::new(),
        }
    }

    /// 入库并订阅；标识重复时跳过该形状。
    fn admit<T: Shape + 'static>(&mut self, shape: Rc<T>) -> bool {
        let shared: SharedShape = shape;
        let id = shared.id().clone();
        match self.repository.add(shared.clone()) {
            Ok(()) => {
                self.warehouse.watch(shared.as_ref());
                true
            }
            Err(err) => {
                warn!(shape_id = %id, error = %err, "形状标识重复，已跳过");
                false
            }
        }
    }
}

fn load_file<P: ShapeParser>(parser: P, path: &Path) -> LoadReport<P::Shape> {
    match ShapeFileLoader::new(parser).load(path) {
        Ok(report) => report,
        Err(err) => {
            warn!(path = %path.display(), error = %err, kind = P::KIND, "无法读取数据文件，按空文件处理");
            LoadReport::default()
        }
    }
}

pub fn run(options: &RunOptions, out: &mut impl Write) -> Result<()> {
    let quadrant = ByQuadrant::new(options.quadrant)
        .with_context(|| format!("无效的象限参数 {}", options.quadrant))?;

    let mut session = Session::new(options.recency_window);

    let rectangles = load_file(RectangleParser, &options.rectangles);
    for rectangle in rectangles.shapes {
        let rectangle = Rc::new(rectangle);
        if session.admit(rectangle.clone()) {
            session.rectangles.push(rectangle);
        }
    }
    let cubes = load_file(CubeParser, &options.cubes);
    for cube in cubes.shapes {
        let cube = Rc::new(cube);
        if session.admit(cube.clone()) {
            session.cubes.push(cube);
        }
    }
    info!(
        rectangles = session.rectangles.len(),
        cubes = session.cubes.len(),
        rejected = rectangles.rejected.len() + cubes.rejected.len(),
        "数据加载完成"
    );

    writeln!(
        out,
        "矩形：{} 个有效，{} 行被拒绝",
        session.rectangles.len(),
        rectangles.rejected.len()
    )?;
    for rejection in &rectangles.rejected {
        writeln!(out, "  ! 第 {} 行：{}", rejection.line.number, rejection.error)?;
    }
    for rectangle in &session.rectangles {
        write_rectangle(out, &session.warehouse, rectangle)?;
    }

    writeln!(
        out,
        "立方体：{} 个有效，{} 行被拒绝",
        session.cubes.len(),
        cubes.rejected.len()
    )?;
    for rejection in &cubes.rejected {
        writeln!(out, "  ! 第 {} 行：{}", rejection.line.number, rejection.error)?;
    }
    for cube in &session.cubes {
        write_cube(out, &session.warehouse, cube)?;
    }

    write_queries(out, &session.repository, &quadrant)?;
    write_sorted(out, &session)?;

    let stats = session.warehouse.cache_stats();
    info!(
        total_shapes = stats.total_shapes,
        recent = stats.cache_hits,
        "缓存统计"
    );
    writeln!(
        out,
        "缓存：{} 条记录，{} 条在最近 {} 秒内写入",
        stats.total_shapes,
        stats.cache_hits,
        session.warehouse.recency_window().as_secs()
    )?;
    Ok(())
}

fn write_rectangle(out: &mut impl Write, warehouse: &Warehouse, rectangle: &Rectangle) -> Result<()> {
    let id = rectangle.id();
    let measures = warehouse.area(rectangle).and_then(|area| {
        let perimeter = warehouse.perimeter(rectangle)?;
        Ok((area, perimeter))
    });
    match (measures, calculators::rectangle::diagonal(rectangle)) {
        (Ok((area, perimeter)), Ok(diagonal)) => writeln!(
            out,
            "  - {id}: 面积={area:.2} 周长={perimeter:.2} 对角线={diagonal:.2} 正方形={} 菱形={} 梯形={}",
            validators::rectangle::is_square(rectangle),
            validators::rectangle::is_rhombus(rectangle),
            validators::rectangle::is_trapezoid(rectangle),
        )?,
        (Err(err), _) => writeln!(out, "  - {id}: 计算失败：{err}")?,
        (_, Err(err)) => writeln!(out, "  - {id}: 计算失败：{err}")?,
    }
    Ok(())
}

fn write_cube(out: &mut impl Write, warehouse: &Warehouse, cube: &Cube) -> Result<()> {
    let id = cube.id();
    let volume = match warehouse.volume(cube) {
        Ok(volume) => volume,
        Err(err) => {
            writeln!(out, "  - {id}: 计算失败：{err}")?;
            return Ok(());
        }
    };
    let surface_area = warehouse.surface_area(cube)?;
    let space_diagonal = calculators::cube::space_diagonal(cube)?;
    let face_diagonal = calculators::cube::face_diagonal(cube)?;
    write!(
        out,
        "  - {id}: 体积={volume:.2} 表面积={surface_area:.2} 体对角线={space_diagonal:.2} 面对角线={face_diagonal:.2}"
    )?;
    for plane in CoordinatePlane::ALL {
        let ratio = calculators::cube::volume_ratio_by_plane(cube, plane)?;
        write!(
            out,
            " {}[贴合={} 体积比={ratio:.3}]",
            plane.name(),
            validators::cube::is_base_on_plane(cube, plane)
        )?;
    }
    writeln!(out)?;
    Ok(())
}

fn join_ids(shapes: &[SharedShape]) -> String {
    shapes
        .iter()
        .map(|shape| shape.id().as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_query(
    out: &mut impl Write,
    repository: &InMemoryShapeRepository,
    label: &str,
    specification: &dyn Specification,
) -> Result<()> {
    let found = repository.find_by_specification(specification);
    writeln!(out, "  {label}: [{}]", join_ids(&found))?;
    Ok(())
}

fn write_queries(
    out: &mut impl Write,
    repository: &InMemoryShapeRepository,
    quadrant: &ByQuadrant,
) -> Result<()> {
    writeln!(out, "查询：")?;
    write_query(
        out,
        repository,
        &format!("第 {} 象限", quadrant.quadrant()),
        quadrant,
    )?;
    write_query(
        out,
        repository,
        "面积 10..=100",
        &ByMetricRange::area(10.0, 100.0)?,
    )?;
    write_query(
        out,
        repository,
        "体积 1..=100",
        &ByMetricRange::volume(1.0, 100.0)?,
    )?;
    write_query(
        out,
        repository,
        "到原点距离 0..=10",
        &ByDistanceFromOrigin::new(0.0, 10.0)?,
    )?;
    Ok(())
}

fn write_sorted(out: &mut impl Write, session: &Session) -> Result<()> {
    let all = session.repository.find_all();
    writeln!(out, "排序：")?;
    writeln!(out, "  按标识: [{}]", join_ids(&sort_shapes(&all, &ById)))?;

    let by_x = ByCoordinate::x();
    writeln!(
        out,
        "  按种类、x 坐标: [{}]",
        join_ids(&sort_shapes_multi_key(&all, &[&ByKind, &by_x]))
    )?;

    let rectangles = session.repository.find_by_kind(Rectangle::KIND);
    let by_area = ByCachedMetric::area(session.warehouse.clone());
    writeln!(
        out,
        "  矩形按面积: [{}]",
        join_ids(&sort_shapes(&rectangles, &by_area))
    )?;

    let cubes = session.repository.find_by_kind(Cube::KIND);
    let by_volume = ByCachedMetric::volume(session.warehouse.clone());
    writeln!(
        out,
        "  立方体按体积: [{}]",
        join_ids(&sort_shapes(&cubes, &by_volume))
    )?;
    Ok(())
}
