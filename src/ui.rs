// UI layer: provides the interactive menu using `dialoguer`.
// Every command reports its own failure and returns to the menu; only a
// broken terminal ends the session.

use crate::api::{parse_trim_length, ApiClient, Identification, Song};
use crate::error::ApiError;
use crate::transport::Transport;
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Main interactive menu. Runs a select loop until the user chooses "Exit".
pub fn main_menu<T: Transport>(api: &ApiClient<T>) -> Result<()> {
    let items = vec![
        "Upload audio clip",
        "Identify song",
        "List previously analyzed songs",
        "Exit",
    ];
    loop {
        let selection = Select::new()
            .with_prompt("Enter a command")
            .items(&items)
            .default(0)
            .interact()?;
        match selection {
            0 => handle_upload(api)?,
            1 => handle_identify(api)?,
            2 => handle_songs(api),
            3 => break,
            _ => {}
        }
    }
    println!();
    println!("** done **");
    Ok(())
}

fn spinner(msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_error(err: &ApiError) {
    tracing::warn!(error = %err, "command failed");
    println!("{} {}", "**ERROR:".red().bold(), err);
}

/// Ask for a file path and upload it.
fn handle_upload<T: Transport>(api: &ApiClient<T>) -> Result<()> {
    let path: String = Input::new()
        .with_prompt("File name for upload")
        .interact_text()?;
    let path = PathBuf::from(path.trim());

    let spinner = spinner("Uploading...");
    let result = api.upload(&path);
    spinner.finish_and_clear();

    match result {
        Ok(jobid) => {
            println!("Uploaded successfully!");
            println!("Job ID (use to refer to the file): {}", jobid.bold());
        }
        Err(e) => print_error(&e),
    }
    Ok(())
}

/// Ask for a job id and a trim length, then identify the clip.
fn handle_identify<T: Transport>(api: &ApiClient<T>) -> Result<()> {
    let jobid: String = Input::new()
        .with_prompt("Job ID to analyze")
        .interact_text()?;
    let trim_input: String = Input::new()
        .with_prompt("Trim length in seconds (Enter for 10)")
        .allow_empty(true)
        .interact_text()?;

    let trim = match parse_trim_length(&trim_input) {
        Ok(trim) => trim,
        Err(e) => {
            print_error(&e);
            return Ok(());
        }
    };
    if trim.raised_to_minimum {
        println!(
            "Too short of a length! Automatically trimming to shortest length, {} seconds.",
            trim.seconds
        );
    }

    let spinner = spinner("Identifying...");
    let result = api.identify(&jobid, trim);
    spinner.finish_and_clear();

    match result {
        Ok(id) => print_identification(&id),
        Err(e) => print_error(&e),
    }
    Ok(())
}

fn print_identification(id: &Identification) {
    println!("Identified Song: {}", id.song.as_str().bold());
    println!("  artist:       {}", id.artist);
    println!("  album:        {}", id.album);
    println!("  release date: {}", id.release_date);
    println!("  score:        {}", id.score_label());
    if id.is_low_confidence() {
        println!(
            "{} The confidence level for this prediction is low, try again with a longer trim length or clearer file!",
            "**NOTE:".yellow()
        );
    }
}

fn handle_songs<T: Transport>(api: &ApiClient<T>) {
    let spinner = spinner("Fetching songs...");
    let result = api.songs();
    spinner.finish_and_clear();

    match result {
        Ok(songs) if songs.is_empty() => println!("No songs analyzed yet."),
        Ok(songs) => songs.iter().for_each(print_song),
        Err(e) => print_error(&e),
    }
}

fn print_song(song: &Song) {
    println!("{}", song.title);
    println!("  {}", song.score);
    println!("  {}", song.artist);
    println!("  {}", song.album);
    println!("  {}", song.release_date);
}
