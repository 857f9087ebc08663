// private sub-module defined in other files
mod byte_order_reader;
mod byte_order_writer;

// exports identifiers from private sub-modules in the current module namespace
pub use self::byte_order_reader::ByteOrderReader;
pub use self::byte_order_reader::Endianness;
pub use self::byte_order_writer::ByteOrderWriter;

use std::time::Instant;

/// Returns a formatted string of elapsed time, e.g.
/// `1min 34s 852ms`
pub fn get_formatted_elapsed_time(instant: Instant) -> String {
    let dur = instant.elapsed();
    let minutes = dur.as_secs() / 60;
    let sub_sec = dur.as_secs() % 60;
    let sub_milli = dur.subsec_millis();
    if minutes > 0 {
        return format!("{}min {}.{}s", minutes, sub_sec, sub_milli);
    }
    format!("{}.{}s", sub_sec, sub_milli)
}

pub fn wrapped_print(val: &str, width: usize) {
    let split_val1: Vec<&str> = val.split("\n\n").collect(); // paragraphs
    for i in 0..split_val1.len() {
        let s = split_val1[i].replace("\n", "");
        let split_val2: Vec<&str> = s.split(" ").collect();
        let mut s1 = String::new();
        for s2 in split_val2 {
            if s1.len() + s2.len() + 1 <= width {
                s1 = format!("{} {}", s1, s2).trim().to_string();
            } else {
                println!("{}", s1);
                s1 = s2.to_string();
            }
        }
        if i < split_val1.len()-1 {
            println!("{}\n", s1);
        } else {
            println!("{}", s1);
        }
    }
}

pub fn wrapped_text(val: &str, width: usize) -> String {
    let split_val1: Vec<&str> = val.split("\n\n").collect(); // paragraphs
    let mut ret = String::new();
    for i in 0..split_val1.len() {
        let s = split_val1[i].replace("\n", "");
        let split_val2: Vec<&str> = s.split(" ").collect();
        let mut s1 = String::new();
        for s2 in split_val2 {
            if s1.len() + s2.len() + 1 <= width {
                s1 = format!("{} {}", s1, s2).trim().to_string();
            } else {
                ret.push_str(&format!("{}\n", s1));
                s1 = s2.to_string();
            }
        }
        if i < split_val1.len()-1 {
            ret.push_str(&format!("{}\n", s1));
        } else {
            ret.push_str(&s1);
        }
    }
    ret
}
