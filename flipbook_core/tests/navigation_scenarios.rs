use std::f32::consts::PI;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use flipbook_core::{
    BookConfig, BookSession, FlipDirection, ManualClock, Modifiers, NavigationEvent, PageId,
    PickHit, PickTarget, SpreadTransform, StrokeOutcome, SurfacePoint,
};

const FRAME: Duration = Duration::from_millis(16);

fn config(page_count: usize) -> BookConfig {
    BookConfig {
        page_count,
        surface_width: 32,
        surface_height: 32,
        ..BookConfig::default()
    }
}

/// Ticks at a fixed frame rate until nothing is moving or scrubbing.
fn settle(session: &mut BookSession<&ManualClock>, clock: &ManualClock) -> Result<usize> {
    for frame in 0..10_000 {
        clock.advance(FRAME);
        let summary = session.tick();
        if summary.animating == 0 && !session.navigation().is_seeking() {
            return Ok(frame + 1);
        }
    }
    bail!("session never settled")
}

#[test]
fn seek_across_a_four_page_book() -> Result<()> {
    let clock = ManualClock::new();
    let mut session = BookSession::new(config(4), &clock)?;
    assert!(session.seek_to(2));

    // Nothing moves until the first scrub interval elapses.
    clock.advance(Duration::from_millis(79));
    session.tick();
    assert!(!session.book().is_animating());

    clock.advance(Duration::from_millis(1));
    session.tick();
    let first = session
        .book()
        .spread(0)
        .and_then(|spread| spread.animator().timeline())
        .context("spread 0 should be flipping")?;
    assert_eq!(first.direction(), FlipDirection::Rightward);
    assert_eq!(session.current_page_index(), 1);

    clock.advance(Duration::from_millis(80));
    session.tick();
    let second = session
        .book()
        .spread(1)
        .and_then(|spread| spread.animator().timeline())
        .context("spread 1 should be flipping")?;
    assert_eq!(second.direction(), FlipDirection::Rightward);
    assert_eq!(session.current_page_index(), 2);
    assert!(!session.navigation_state().seeking);

    settle(&mut session, &clock)?;
    for spread in session.book().spreads() {
        let pose = spread.transform();
        assert_eq!(pose.rotation_y, -PI);
        assert_eq!(pose, SpreadTransform::turned(spread.resting_depth()));
    }
    assert_eq!(
        session.drain_events(),
        vec![
            NavigationEvent::SeekStarted { from: 0, target: 2 },
            NavigationEvent::SeekFinished { page: 2 },
        ]
    );
    Ok(())
}

#[test]
fn full_length_scrub_returns_every_sheet() -> Result<()> {
    let clock = ManualClock::new();
    let mut session = BookSession::new(config(64), &clock)?;
    let spreads = session.book().spread_count();

    assert!(session.seek_to(usize::MAX));
    settle(&mut session, &clock)?;
    assert_eq!(session.current_page_index(), spreads);

    assert!(session.seek_to(0));
    settle(&mut session, &clock)?;
    assert_eq!(session.current_page_index(), 0);
    for spread in session.book().spreads() {
        assert_eq!(
            spread.transform(),
            SpreadTransform::resting(spread.resting_depth())
        );
    }
    assert_eq!(session.navigation().flips_requested(), 2 * spreads as u64);
    Ok(())
}

#[test]
fn rapid_steps_restart_flips_without_stacking() -> Result<()> {
    let clock = ManualClock::new();
    let mut session = BookSession::new(config(6), &clock)?;
    session.step_right();
    clock.advance(Duration::from_millis(100));
    session.tick();
    session.step_left();

    let spread = session.book().spread(0).context("spread 0")?;
    assert_eq!(spread.animator().flips_started(), 2);
    assert_eq!(
        spread.transform(),
        SpreadTransform::turned(spread.resting_depth())
    );

    settle(&mut session, &clock)?;
    let spread = session.book().spread(0).context("spread 0")?;
    assert_eq!(
        spread.transform(),
        SpreadTransform::resting(spread.resting_depth())
    );
    Ok(())
}

#[test]
fn gesture_across_two_pages_draws_nothing_between_them() -> Result<()> {
    let clock = ManualClock::new();
    let mut session = BookSession::new(config(4), &clock)?;
    session.set_draw_mode(true);
    assert!(session.pointer_down());

    // Pointer sweeps left to right across the binding: page 1 then page 2.
    let picker = |ndc: [f32; 2]| {
        let (target, x) = if ndc[0] < 0.0 {
            (PickTarget::Page(PageId(1)), 1.0 + ndc[0])
        } else {
            (PickTarget::Page(PageId(2)), ndc[0])
        };
        Some(PickHit {
            target,
            point: [ndc[0], ndc[1], 0.0],
            uv: SurfacePoint::new(x, 0.5),
            distance: 1000.0,
        })
    };

    let mut pages_hit = Vec::new();
    for step in 0..=8 {
        let x = -0.8 + step as f32 * 0.2;
        if let StrokeOutcome::Painted { page, segment } =
            session.pointer_move([x, 0.0], Modifiers::default(), &picker)
        {
            if let Some(segment) = segment {
                assert!(
                    (segment.from.x - segment.to.x).abs() < 0.5,
                    "segment on {page} spans the binding"
                );
            }
            pages_hit.push(page);
        }
    }
    assert_eq!(session.pointer_up(), Some(PageId(2)));

    assert!(pages_hit.contains(&PageId(1)) && pages_hit.contains(&PageId(2)));
    let book = session.book();
    let left = book.page(PageId(1)).context("page 1")?.surface();
    let right = book.page(PageId(2)).context("page 2")?.surface();
    assert!(left.segments_drawn() > 0 && right.segments_drawn() > 0);
    assert!(!left.is_stroking() && !right.is_stroking());

    // Page 1 ink stops where the pointer left it; nothing runs to the binding.
    let row = left.height() / 2;
    assert_eq!(left.pixel(left.width() - 1, row).map(|px| px[3]), Some(0));
    Ok(())
}
