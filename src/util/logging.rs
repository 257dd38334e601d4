use crate::info;

/// Format a message reporting the total number of gather operations.
pub fn format_total_gathers(count: usize) -> String {
    format!("Total gather ops: {}", count)
}

/// Log the total number of gather operations at info level.
pub fn log_total_gathers(count: usize) {
    info!("{}", format_total_gathers(count));
}

/// Format a message reporting the shape of an assembled feature tensor.
pub fn format_assembled_shape(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    format!("Assembled features: ({})", dims.join(", "))
}

/// Log the assembled tensor shape at info level.
pub fn log_assembled_shape(shape: &[usize]) {
    info!("{}", format_assembled_shape(shape));
}
