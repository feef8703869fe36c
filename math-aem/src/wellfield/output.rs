//! Output JSON formatting for well-field studies
//!
//! Water-table cells and contours are written as GeoJSON-style feature
//! collections so a map client can draw them directly.

use serde_json::{Value, json};

use super::{WellFieldConfig, WellFieldResult};
use crate::contour::{ContourSet, GridCell};

/// Status reported with every successful study
pub const STATUS_MESSAGE: &str = "Data analysis complete!";

/// Water-table cells as polygon features with an `elevation` property
pub fn water_table_feature_collection(cells: &[GridCell]) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": cells.iter().map(|cell| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [cell.polygon],
                },
                "properties": {
                    "elevation": cell.elevation,
                },
            })
        }).collect::<Vec<_>>(),
    })
}

/// Contour segments as line features with a `head` property
pub fn contours_feature_collection(contours: &ContourSet) -> Value {
    json!({
        "type": "FeatureCollection",
        "levels": contours.levels,
        "features": contours.segments.iter().map(|seg| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [seg.start, seg.end],
                },
                "properties": {
                    "head": seg.level,
                },
            })
        }).collect::<Vec<_>>(),
    })
}

/// Create the complete output document of a study
pub fn create_output_json(config: &WellFieldConfig, result: &WellFieldResult) -> Value {
    let range = result.elevation_range();
    json!({
        "status": STATUS_MESSAGE,
        "local_water_table": water_table_feature_collection(&result.cells),
        "contours": contours_feature_collection(&result.contours),
        "summary": {
            "wells": config.wells.points().zip(&result.well_heads).map(|((x, y), h)| {
                json!({ "x": x, "y": y, "discharge": result.well_rate, "head": h })
            }).collect::<Vec<_>>(),
            "total_flow": config.total_flow,
            "reference": {
                "x": result.reference_point[0],
                "y": result.reference_point[1],
                "head": result.reference_head,
            },
            "min_elevation": range.map(|(lo, _)| lo),
            "max_elevation": range.map(|(_, hi)| hi),
            "initial_elevation": config.aquifer.initial_elevation,
            "desired_elevation": config.aquifer.desired_elevation,
            "elapsed_secs": result.elapsed_secs,
        },
        "metadata": {
            "description": config.metadata.description,
            "author": config.metadata.author,
            "date": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        },
    })
}
