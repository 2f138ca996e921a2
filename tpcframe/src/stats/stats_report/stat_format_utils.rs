use crate::util::*;

/// Used for formatting fields that potentially produces many values.
const MAX_LINE_WIDTH: usize = 60;

/// Format a size in bytes to human readable.
pub(crate) fn format_data_size(size_bytes: u64) -> String {
    match size_bytes {
        0..=1024 => format!("{} B", size_bytes),
        1025..=1048576 => {
            format!("{:.2} KiB", size_bytes as f64 / 1024_f64)
        }
        1048577..=1073741824 => {
            format!("{:.2} MiB", size_bytes as f64 / 1048576_f64)
        }
        _ => format!("{:.2} GiB", size_bytes as f64 / 1073741824_f64),
    }
}

/// Format the packet ids seen, wrapping lines.
pub(crate) fn format_packet_ids(packet_ids: &[i32]) -> String {
    if packet_ids.is_empty() {
        return "none".red().to_string();
    }
    format_nums_max_lines_width(MAX_LINE_WIDTH, Some(5), packet_ids)
}

/// Format the FEE boards seen with data errors marked red.
pub(crate) fn format_fee_ids(fee_ids: &[u16], fee_ids_with_errors: &[u16]) -> String {
    if fee_ids.is_empty() {
        return "none".red().to_string();
    }
    fee_ids
        .iter()
        .sorted_unstable()
        .map(|fee| {
            if fee_ids_with_errors.contains(fee) {
                format!("{fee}").red().to_string()
            } else {
                fee.to_string()
            }
        })
        .join(" ")
}

/// Format the reference BCO range of the time frames.
pub(crate) fn format_bco_range(range: Option<(u64, u64)>) -> String {
    match range {
        Some((first, last)) => format!("{first:#012X} - {last:#012X}"),
        None => "none".red().to_string(),
    }
}

/// Generic function to format a list of numbers into a string with a max width and optional max lines.
pub fn format_nums_max_lines_width<T: fmt::Display>(
    max_width: usize,
    max_lines: Option<usize>,
    nums: &[T],
) -> String {
    let mut result = String::new();
    let mut num_chars = 0;
    let mut line_count = 0;
    for (i, num) in nums.iter().enumerate() {
        let num_str = num.to_string();
        // +1 for whitespace
        let tmp_num_chars = num_str.len() + 1;
        if num_chars + tmp_num_chars > max_width {
            line_count += 1;
            if max_lines.is_some_and(|max_lines| line_count >= max_lines) {
                result.push_str(&format!("... {} more", nums.len() - i).yellow().to_string());
                break;
            }
            result.push('\n');
            num_chars = 0;
        }
        result.push_str(&num_str);
        result.push(' ');
        num_chars += tmp_num_chars;
    }
    result
}
