use crate::error::WorkshopError;
use crate::scanner::Subscription;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use std::io::{self, BufRead, IsTerminal, Write};

/// Checks every index against the inventory before anything is deleted.
///
/// Returns the indices in the order given, with repeats dropped so no
/// subscription is deleted twice.
pub fn validate(inventory: &[Subscription], indices: &[i64]) -> Result<Vec<usize>, WorkshopError> {
    let len = inventory.len();
    let mut selected: Vec<usize> = Vec::with_capacity(indices.len());

    for &index in indices {
        let i = usize::try_from(index)
            .ok()
            .filter(|&i| i < len)
            .ok_or(WorkshopError::OutOfRange { index, len })?;
        if selected.contains(&i) {
            tracing::debug!(index = i, "ignoring repeated selection");
            continue;
        }
        selected.push(i);
    }

    Ok(selected)
}

/// Splits a line of whitespace-separated integers.
pub fn parse_indices(line: &str) -> Result<Vec<i64>, WorkshopError> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| WorkshopError::InvalidInput(format!("not a number: {token}")))
        })
        .collect()
}

/// True only when the first word is `y`, in either case.
pub fn parse_yes_no(line: &str) -> Result<bool, WorkshopError> {
    let first = line
        .split_whitespace()
        .next()
        .ok_or_else(|| WorkshopError::InvalidInput("expected y or n".to_string()))?;
    Ok(first.eq_ignore_ascii_case("y"))
}

fn read_plain_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<String> {
    write!(output, "{prompt} ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line)
}

/// Prompts on a terminal; reads a plain line when stdin is piped, so
/// `echo 0 | workshopclean ...` works. End of input reads as an empty line.
fn read_line(prompt: &str) -> Result<String, WorkshopError> {
    if !io::stdin().is_terminal() {
        let line = read_plain_line(&mut io::stdin().lock(), &mut io::stdout(), prompt)?;
        return Ok(line);
    }

    let line = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(line)
}

pub fn read_indices() -> Result<Vec<i64>, WorkshopError> {
    parse_indices(&read_line("Delete which? (space separated)")?)
}

pub fn read_yes_no() -> Result<bool, WorkshopError> {
    parse_yes_no(&read_line("Delete (y/n)?")?)
}
