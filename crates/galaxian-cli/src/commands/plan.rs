use super::{json_pretty, load_plan, EXIT_SUCCESS};
use std::path::Path;

pub fn run(config: &Path, json: bool) -> Result<u8, String> {
    let plan = load_plan(config)?;

    if json {
        println!("{}", json_pretty(&plan)?);
        return Ok(EXIT_SUCCESS);
    }

    let bold = console::Style::new().bold();
    println!(
        "{} {} {}",
        bold.apply_to(&plan.ident),
        plan.version,
        plan.targets.join(", ")
    );
    for source in &plan.sources {
        println!("  source  {}  {}", source.ident, source.url);
    }
    for project in &plan.projects {
        println!(
            "  project {}  ({}/{})",
            project.ident, project.source, project.workdir
        );
    }
    if plan.projects.is_empty() {
        println!("  (no enabled projects)");
    }
    Ok(EXIT_SUCCESS)
}
