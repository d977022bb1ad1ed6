use colored::Colorize;
use shared::models::builtin_templates;

/// Prints the template catalog in display order.
pub fn list_templates() {
    for template in builtin_templates() {
        println!(
            "{} {} ({})",
            format!("{:<8}", template.key).bold(),
            template.title,
            template.icon.dimmed()
        );
        for choice in &template.choices {
            println!("         - {}", choice.title);
        }
    }
}
