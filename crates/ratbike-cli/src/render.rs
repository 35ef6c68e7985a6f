//! Text rendering of bikes for terminal output.

use ratbike_core::{Bike, BikePart, BikesFilter};

use crate::utils::{format_optional, short_id, truncate_string};

/// Widest title shown in a list row
const MAX_TITLE_WIDTH: usize = 40;

/// One list row: completion box, short id, title.
pub fn bike_row(bike: &Bike) -> String {
    let check = if bike.is_complete() { "[x]" } else { "[ ]" };
    let title = format_optional(bike.title_for_list(), "(untitled)");
    format!(
        "{} {}  {}",
        check,
        short_id(bike.id()),
        truncate_string(&title, MAX_TITLE_WIDTH)
    )
}

/// Filter header followed by one row per bike, or the filter's empty message.
///
/// `saved` is the age of the local store, shown in the header when known.
pub fn bike_list(filter: BikesFilter, bikes: &[Bike], saved: Option<&str>) -> String {
    if bikes.is_empty() {
        return filter.empty_message().to_string();
    }
    let header = match saved {
        Some(age) => format!("{} ({}), saved {}", filter.label(), bikes.len(), age),
        None => format!("{} ({})", filter.label(), bikes.len()),
    };
    let mut lines = vec![header];
    lines.extend(bikes.iter().map(bike_row));
    lines.join("\n")
}

/// Full description of one bike.
pub fn bike_detail(bike: &Bike) -> String {
    let mut lines = vec![
        format!("Id:       {}", bike.id()),
        format!("Type:     {}", format_optional(bike.bike_type(), "-")),
        format!("Address:  {}", format_optional(bike.address(), "-")),
    ];

    if bike.is_complete() {
        lines.push("Status:   complete bike".to_string());
    } else {
        let present = bike.present_parts();
        lines.push(format!(
            "Status:   partial bike ({}/{} parts)",
            present.len(),
            BikePart::COUNT
        ));
        lines.push(format!("Present:  {}", part_names(&present)));
        lines.push(format!("Missing:  {}", part_names(&bike.missing_parts())));
    }

    if let Some(image) = bike.image() {
        lines.push(format!("Image:    {} bytes", image.len()));
    }
    lines.join("\n")
}

/// Numbered part table for `--parts`.
pub fn part_table() -> String {
    BikePart::ALL
        .iter()
        .map(|part| format!("{:>2}  {}", part.index(), part))
        .collect::<Vec<_>>()
        .join("\n")
}

fn part_names(parts: &[BikePart]) -> String {
    if parts.is_empty() {
        return "none".to_string();
    }
    parts
        .iter()
        .map(|p| p.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}
