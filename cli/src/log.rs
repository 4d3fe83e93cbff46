use colored::Colorize;

pub fn print_title(title: &str) {
    println!();
    println!("{}", title.bold().cyan());
}

pub fn print_section_header(header: &str) {
    println!();
    println!("{}", format!("── {header} ──").bold());
}

pub fn print_message(message: &str) {
    println!("  {message}");
}

pub fn print_info(message: &str) {
    println!("{}", message.dimmed());
}

pub fn print_success(message: &str) {
    println!("{}", message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

pub fn print_divider() {
    println!("{}", "─".repeat(48).dimmed());
}
