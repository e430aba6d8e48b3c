//! The `examforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let banks = examforge_stores::load_banks(&bank_path)?;
    anyhow::ensure!(!banks.is_empty(), "no .toml banks found in {}", bank_path.display());

    let mut total_issues = 0;

    for bank in &banks {
        println!(
            "Bank: {} \"{}\" ({} questions)",
            bank.bank.id,
            bank.bank.name,
            bank.questions.len()
        );

        let issues = bank.issues();
        for issue in &issues {
            println!("  WARNING: {issue}");
        }
        total_issues += issues.len();
    }

    if total_issues == 0 {
        println!("All banks valid.");
    } else {
        println!("\n{total_issues} issue(s) found.");
    }

    Ok(())
}
