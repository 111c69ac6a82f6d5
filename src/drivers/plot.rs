use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::drivers::error::ChartError;
use crate::drivers::store::HistoryFrame;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: WHITE,
        }
    }
}
/// Value range covering every visible point, padded when flat.
pub fn value_bounds(frame: &HistoryFrame) -> Option<(f64, f64)> {
    let mut values = frame
        .channels
        .iter()
        .filter(|c| c.visible)
        .flat_map(|c| c.points.iter().filter_map(|(_, v)| *v))
        .map(|v| v as f64);
    let first = values.next()?;
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if (max - min).abs() < f64::EPSILON {
        Some((min - 1.0, max + 1.0))
    } else {
        Some((min, max))
    }
}
/// Renders the visible channels of the window to a PNG. The x-axis is the sample index.
pub fn render_chart_png(frame: &HistoryFrame, style: PlotStyle) -> Result<Vec<u8>, ChartError> {
    let (y_min, y_max) = value_bounds(frame)
        .ok_or_else(|| ChartError::Plot("history window has no visible samples".into()))?;
    let len = frame.x_axis.len();
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption("Live Chart", ("sans-serif", 20).into_font())
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0f64..len.max(2) as f64 - 1.0, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_desc("Sample")
            .y_desc("Value")
            .light_line_style(&BLACK.mix(0.05))
            .draw()?;
        for channel in frame.channels.iter().filter(|c| c.visible) {
            let [r, g, b] = channel.color;
            let color = RGBColor(r, g, b);
            let offset = len - channel.points.len();
            // A gap splits the line into separate segments.
            let mut segments: Vec<Vec<(f64, f64)>> = vec![Vec::new()];
            for (i, (_, value)) in channel.points.iter().enumerate() {
                match value {
                    Some(v) => {
                        if let Some(segment) = segments.last_mut() {
                            segment.push(((offset + i) as f64, *v as f64));
                        }
                    }
                    None => segments.push(Vec::new()),
                }
            }
            let mut labelled = false;
            for segment in segments.into_iter().filter(|s| !s.is_empty()) {
                let series = chart.draw_series(LineSeries::new(segment, &color))?;
                if !labelled {
                    series
                        .label(channel.label.clone())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
                    labelled = true;
                }
            }
        }
        chart
            .configure_series_labels()
            .border_style(&BLACK.mix(0.2))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ChartError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| ChartError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::store::ChannelStore;
    use crate::drivers::XValue;
    #[test]
    fn bounds_skip_hidden_channels_and_gaps() {
        let mut store = ChannelStore::default();
        store.observe(&[1, 500], XValue::Counter(1));
        store.observe(&[-3], XValue::Counter(2));
        store.toggle_visibility(1);
        assert_eq!(value_bounds(&store.frame()), Some((-3.0, 1.0)));
    }
    #[test]
    fn flat_series_gets_padding() {
        let mut store = ChannelStore::default();
        store.observe(&[4], XValue::Counter(1));
        assert_eq!(value_bounds(&store.frame()), Some((3.0, 5.0)));
    }
    #[test]
    fn empty_window_cannot_be_rendered() {
        let err = render_chart_png(&HistoryFrame::default(), PlotStyle::default()).unwrap_err();
        assert!(matches!(err, ChartError::Plot(_)));
    }
}
