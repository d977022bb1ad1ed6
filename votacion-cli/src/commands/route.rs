use anyhow::Result;
use client::{App, routes};
use colored::Colorize;

/// Resolves `path`, runs the navigation guard and prints where it lands.
pub fn check(app: &App, path: &str) -> Result<()> {
    let requested = app.router.push_path(path)?;
    let wanted = routes::resolve(path).map(|location| location.name);
    let descriptor = requested.name.descriptor();

    println!("path:       {path}");
    if wanted == Some(requested.name) {
        println!("route:      {} ({})", requested.name, descriptor.visibility);
        println!("view:       {}", descriptor.view);
        println!("outcome:    {}", "allowed".green());
    } else {
        println!("outcome:    {} to {}", "redirected".yellow(), requested);
    }
    Ok(())
}
