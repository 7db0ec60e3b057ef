//! Region bar chart rendered to PNG with Plotters.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::{ChartArtifact, GroupTotal};
use crate::error::PipelineError;
use crate::plot::fonts::{CHART_FONT_FAMILY, ensure_chart_font};
use crate::report::format::format_currency;

pub const CHART_FILE_NAME: &str = "sales_by_region.png";
pub const CHART_WIDTH_PX: u32 = 1000;
pub const CHART_HEIGHT_PX: u32 = 600;

const BAR_COLOR: RGBColor = RGBColor(135, 206, 235); // sky blue

/// Draw one bar per region (height = total sales) to
/// `<output_dir>/sales_by_region.png`, overwriting any previous chart.
pub fn render_region_chart(
    regions: &[GroupTotal],
    output_dir: &Path,
    font: Option<&Path>,
) -> Result<ChartArtifact, PipelineError> {
    let path = output_dir.join(CHART_FILE_NAME);
    log::info!("Creating sales by region chart: {}", path.display());

    if regions.is_empty() {
        return Err(PipelineError::render(&path, "No regions to plot."));
    }

    let with_text = ensure_chart_font(font);
    draw_bar_chart(&path, regions, with_text).map_err(|e| PipelineError::render(&path, e.to_string()))?;

    log::info!("Chart saved to {}", path.display());
    Ok(ChartArtifact {
        path,
        width_px: CHART_WIDTH_PX,
        height_px: CHART_HEIGHT_PX,
    })
}

fn draw_bar_chart(path: &Path, regions: &[GroupTotal], with_text: bool) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (CHART_WIDTH_PX, CHART_HEIGHT_PX)).into_drawing_area();
    root.fill(&WHITE)?;

    let (y0, y1) = value_range(regions);
    let n = regions.len() as u32;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(15);
    if with_text {
        builder
            .caption("Total Sales by Region", (CHART_FONT_FAMILY, 28))
            .x_label_area_size(50)
            .y_label_area_size(100);
    }
    let mut chart = builder.build_cartesian_2d((0..n).into_segmented(), y0..y1)?;

    // Without a font, any text draw fails, so axes and labels are skipped.
    if with_text {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(BLACK.mix(0.15))
            .x_desc("Region")
            .y_desc("Total Sales ($)")
            .axis_desc_style((CHART_FONT_FAMILY, 18))
            .label_style((CHART_FONT_FAMILY, 14))
            .x_labels(regions.len())
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => regions.get(*i as usize).map(|g| g.key.clone()).unwrap_or_default(),
                _ => String::new(),
            })
            .y_label_formatter(&|v| axis_amount(*v))
            .draw()?;
    }

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR_COLOR.filled())
            .margin(12)
            .data(regions.iter().enumerate().map(|(i, g)| (i as u32, g.total))),
    )?;

    root.present()?;
    Ok(())
}

/// Y bounds that always include zero, with headroom above the tallest bar.
fn value_range(regions: &[GroupTotal]) -> (f64, f64) {
    let max = regions.iter().map(|g| g.total).fold(0.0_f64, f64::max);
    let min = regions.iter().map(|g| g.total).fold(0.0_f64, f64::min);
    let top = if max > 0.0 { max * 1.05 } else { 1.0 };
    let bottom = if min < 0.0 { min * 1.05 } else { 0.0 };
    (bottom, top)
}

fn axis_amount(v: f64) -> String {
    let s = format_currency(v.round());
    s.strip_suffix(".00").map(str::to_string).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> Vec<GroupTotal> {
        vec![
            GroupTotal::new("Region B", 250.50),
            GroupTotal::new("Region A", 100.00),
            GroupTotal::new("Region C", 75.25),
        ]
    }

    #[test]
    fn writes_png_of_fixed_size() {
        let dir = tempfile::tempdir().unwrap();
        let chart = render_region_chart(&regions(), dir.path(), None).unwrap();

        assert_eq!(chart.path, dir.path().join(CHART_FILE_NAME));
        assert_eq!((chart.width_px, chart.height_px), (1000, 600));
        let bytes = std::fs::read(&chart.path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn overwrites_previous_chart() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CHART_FILE_NAME), b"stale").unwrap();
        render_region_chart(&regions(), dir.path(), None).unwrap();
        let bytes = std::fs::read(dir.path().join(CHART_FILE_NAME)).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn empty_regions_are_a_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_region_chart(&[], dir.path(), None).unwrap_err();
        assert!(matches!(err, PipelineError::Render { .. }));
        assert!(!dir.path().join(CHART_FILE_NAME).exists());
    }

    #[test]
    fn value_range_includes_zero() {
        assert_eq!(value_range(&[GroupTotal::new("a", 100.0)]), (0.0, 105.0));
        let (lo, hi) = value_range(&[GroupTotal::new("a", -10.0), GroupTotal::new("b", 20.0)]);
        assert!(lo < -10.0 && hi > 20.0);
        assert_eq!(value_range(&[GroupTotal::new("a", 0.0)]), (0.0, 1.0));
    }

    #[test]
    fn axis_labels_drop_cents() {
        assert_eq!(axis_amount(1234.4), "1,234");
        assert_eq!(axis_amount(0.0), "0");
    }
}
