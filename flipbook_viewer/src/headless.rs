//! Windowless run: drives a scrub on a virtual clock at a fixed frame rate so
//! the flip trace is reproducible.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, bail};
use flipbook_core::{
    Book, BookSession, Clock, ManualClock, NavigationEvent, NavigationState, SpreadTransform,
};
use serde::Serialize;

use crate::cli::Args;

/// One 60 Hz frame.
pub const FRAME_STEP: Duration = Duration::from_micros(16_667);
/// Upper bound on simulated frames (ten minutes of wall time).
const MAX_FRAMES: u32 = 60 * 600;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrubReport {
    pub from: usize,
    pub target: usize,
    pub visited: Vec<usize>,
    pub flips: u64,
    pub elapsed_ms: u64,
    /// Everything a position indicator would have been told, in order.
    pub events: Vec<NavigationEvent>,
    pub state: NavigationState,
    /// Resting pose of every sheet once the book has settled.
    pub settled: Vec<SpreadTransform>,
}

pub fn run(args: &Args, book: Book) -> Result<()> {
    let Some(target) = args.seek else {
        println!("[flipbook_viewer] headless mode requested; viewer window bootstrap skipped.");
        return Ok(());
    };

    let report = simulate_scrub(book, target)?;
    for page in &report.visited {
        println!("[flipbook_viewer] visited {page}");
    }
    println!(
        "[flipbook_viewer] scrub {} -> {} settled after {} flips in {} ms",
        report.from, report.target, report.flips, report.elapsed_ms
    );

    if let Some(path) = args.report_json.as_deref() {
        write_report(&report, path)?;
        println!("[flipbook_viewer] report written to {}", path.display());
    }
    Ok(())
}

/// Scrubs from the front cover to `target` and steps frames until the scrub
/// has finished and every flip has settled.
pub fn simulate_scrub(book: Book, target: usize) -> Result<ScrubReport> {
    let clock = ManualClock::new();
    let mut session = BookSession::from_book(book, &clock);
    let from = session.current_page_index();
    let target = target.min(session.book().spread_count());

    if !session.seek_to(target) {
        return Ok(ScrubReport {
            from,
            target,
            visited: vec![from],
            flips: 0,
            elapsed_ms: 0,
            events: session.drain_events(),
            state: session.navigation_state(),
            settled: settled_poses(session.book()),
        });
    }

    let mut frames = 0;
    while session.navigation().is_seeking() || session.book().is_animating() {
        if frames >= MAX_FRAMES {
            bail!("scrub to {target} did not settle within {MAX_FRAMES} frames");
        }
        clock.advance(FRAME_STEP);
        session.tick();
        frames += 1;
    }

    let events = session.drain_events();
    let navigation = session.navigation();
    Ok(ScrubReport {
        from,
        target,
        visited: navigation.scrub_path().to_vec(),
        flips: navigation.flips_requested(),
        elapsed_ms: clock.now().as_millis() as u64,
        events,
        state: navigation.state(),
        settled: settled_poses(session.book()),
    })
}

fn settled_poses(book: &Book) -> Vec<SpreadTransform> {
    book.spreads().iter().map(|spread| spread.transform()).collect()
}

pub fn write_report(report: &ScrubReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serializing scrub report")?;
    fs::write(path, json).with_context(|| format!("writing scrub report {}", path.display()))?;
    Ok(())
}
