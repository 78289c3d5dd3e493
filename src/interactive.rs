use crate::timing::RationalFactor;
use console::style;
use dialoguer::Confirm;
use std::path::Path;

/// Whether to go ahead and write `output`.
///
/// Asks before replacing an existing file; `assume_yes` skips the question.
pub fn confirm_overwrite(output: &Path, assume_yes: bool) -> anyhow::Result<bool> {
    if !output.exists() || assume_yes {
        return Ok(true);
    }

    println!(
        "{} Output file {} already exists.",
        style("!").yellow(),
        style(output.display()).bold()
    );

    let proceed = Confirm::new()
        .with_prompt("Do you want to overwrite it?")
        .default(false)
        .interact()?;

    Ok(proceed)
}

pub fn print_header(input: &Path, output: &Path, factor: &RationalFactor) {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║         palfix - PAL speedup correction           ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
    println!("  {} {}", style("Input: ").dim(), input.display());
    println!("  {} {}", style("Output:").dim(), output.display());
    println!("  {} {}", style("Factor:").dim(), style(factor).green());
    println!();
}
