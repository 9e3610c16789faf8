use anyhow::Result;
use reveal_config::{RevealConfig, ScrollConfig};
use reveal_scene::{
    AnimatableProperty, AnimationState, EasingFunction, ElementId, ElementSpec, PropertySet,
    QueuedEvent, SectionSpec, SectionTimelineSpec, Stage, StageEvent, StepSpec, TimelineEvent,
    TimelineSpec, TriggerEventKind, TriggerSpec,
};

fn config() -> RevealConfig {
    let mut config = RevealConfig::default();
    config.scroll = ScrollConfig {
        smooth: false,
        ..Default::default()
    };
    config.stage.viewport_height = 1000.0;
    config.stage.content_height = 4000.0;
    config.stage.frame_ms = 10.0;
    config
}

fn opacity(stage: &Stage, element: &str) -> f64 {
    stage
        .surface()
        .resolve_f64(&ElementId::new(element), AnimatableProperty::Opacity, f64::NAN)
}

fn hidden() -> PropertySet {
    PropertySet::new().with(AnimatableProperty::Opacity, 0.0)
}

fn shown() -> PropertySet {
    PropertySet::new().with(AnimatableProperty::Opacity, 1.0)
}

/// "about" spans 1200..1600; with "top 70%" / "bottom 30%" and a 1000px
/// viewport its window is [500, 1300).
fn about_trigger() -> Result<TriggerSpec> {
    Ok(TriggerSpec::element("about")
        .with_start("top 70%".parse::<reveal_scene::Marker>()?)
        .with_end("bottom 30%".parse::<reveal_scene::Marker>()?))
}

const CARDS: [&str; 4] = ["card-0", "card-1", "card-2", "card-3"];

fn about_section() -> Result<SectionSpec> {
    let mut section = SectionSpec::new("about")
        .with_element(ElementSpec::new("about", 1200.0, 400.0))
        .with_element(ElementSpec::new("about-title", 1220.0, 60.0));
    for (i, card) in CARDS.iter().enumerate() {
        section = section.with_element(ElementSpec::new(*card, 1300.0 + i as f64 * 60.0, 50.0));
    }

    let timeline = TimelineSpec::new("about-reveal")
        .with_easing(EasingFunction::Linear)
        .with_step(
            StepSpec::new(["about-title"], shown())
                .with_from(hidden())
                .with_duration(300.0),
        )
        .with_step(
            StepSpec::new(CARDS, shown())
                .with_from(hidden())
                .with_duration(400.0)
                .with_stagger(100.0),
        );
    Ok(section.with_timeline(SectionTimelineSpec::triggered(timeline, about_trigger()?)))
}

fn trigger_kinds(events: &[QueuedEvent]) -> Vec<TriggerEventKind> {
    events
        .iter()
        .filter_map(|q| match &q.event {
            StageEvent::Trigger(trigger) => Some(trigger.kind),
            _ => None,
        })
        .collect()
}

fn seq_of(events: &[QueuedEvent], matches: impl Fn(&TimelineEvent) -> bool) -> Option<u64> {
    events.iter().find_map(|q| match &q.event {
        StageEvent::Timeline(event) if matches(event) => Some(q.seq),
        _ => None,
    })
}

#[test]
fn fade_then_stagger_forward_and_back() -> Result<()> {
    let mut stage = Stage::new(&config());
    stage.mount(&about_section()?)?;
    stage.step();
    assert_eq!(opacity(&stage, "card-0"), 0.0);
    stage.drain_events();

    // Down into the window
    stage.scroll_to(800.0);
    stage.run_for(2000.0);
    let forward = stage.drain_events();
    assert_eq!(trigger_kinds(&forward), vec![TriggerEventKind::Enter]);

    let title_done = seq_of(&forward, |e| {
        matches!(e, TimelineEvent::TweenCompleted { element, .. } if element.as_str() == "about-title")
    })
    .expect("title completes");
    let first_card = seq_of(&forward, |e| matches!(e, TimelineEvent::TweenStarted { step: 1, .. }))
        .expect("cards start");
    assert!(title_done < first_card, "fade-in finishes before the stagger begins");

    let card_completions: Vec<(String, f64)> = forward
        .iter()
        .filter_map(|q| match &q.event {
            StageEvent::Timeline(TimelineEvent::TweenCompleted { step: 1, element, .. }) => {
                Some((element.to_string(), q.time_ms))
            }
            _ => None,
        })
        .collect();
    let order: Vec<&str> = card_completions.iter().map(|(e, _)| e.as_str()).collect();
    assert_eq!(order, CARDS);
    for pair in card_completions.windows(2) {
        assert!(((pair[1].1 - pair[0].1) - 100.0).abs() < 1e-6);
    }
    for card in CARDS {
        assert_eq!(opacity(&stage, card), 1.0);
    }

    // Back above the window
    stage.scroll_to(200.0);
    stage.run_for(2000.0);
    let backward = stage.drain_events();
    assert_eq!(trigger_kinds(&backward), vec![TriggerEventKind::Exit]);

    let reverted: Vec<String> = backward
        .iter()
        .filter_map(|q| match &q.event {
            StageEvent::Timeline(TimelineEvent::TweenReverted { element, .. }) => {
                Some(element.to_string())
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        reverted,
        vec!["card-3", "card-2", "card-1", "card-0", "about-title"]
    );
    assert!(
        backward
            .iter()
            .any(|q| matches!(q.event, StageEvent::Timeline(TimelineEvent::Reversed { .. })))
    );
    assert_eq!(opacity(&stage, "about-title"), 0.0);
    Ok(())
}

#[test]
fn jump_past_window_enters_before_exiting() -> Result<()> {
    let mut stage = Stage::new(&config());
    stage.mount(&about_section()?)?;
    stage.step();
    stage.drain_events();

    stage.scroll_to(3000.0);
    stage.step();
    let events = stage.drain_events();
    let crossings: Vec<&QueuedEvent> = events
        .iter()
        .filter(|q| matches!(q.event, StageEvent::Trigger(_)))
        .collect();

    assert_eq!(crossings.len(), 2);
    assert_eq!(trigger_kinds(&events), vec![TriggerEventKind::Enter, TriggerEventKind::Exit]);
    assert!(crossings[0].seq < crossings[1].seq);
    assert_eq!(crossings[0].frame, crossings[1].frame);
    Ok(())
}

#[test]
fn reentering_active_window_is_silent() -> Result<()> {
    let mut stage = Stage::new(&config());
    stage.mount(&about_section()?)?;
    stage.step();

    for y in [600.0, 700.0, 800.0, 900.0, 1000.0, 800.0] {
        stage.scroll_to(y);
        stage.step();
    }
    let events = stage.drain_events();
    assert_eq!(trigger_kinds(&events), vec![TriggerEventKind::Enter]);
    Ok(())
}

#[test]
fn many_small_frames_cross_once() -> Result<()> {
    let mut config = config();
    config.scroll.smooth = true;
    config.scroll.lerp = 0.05;
    let mut stage = Stage::new(&config);
    stage.mount(&about_section()?)?;
    stage.step();

    stage.scroll_to(800.0);
    stage.settle(10_000.0);
    assert_eq!(stage.current_position().y, 800.0);

    let events = stage.drain_events();
    assert_eq!(trigger_kinds(&events), vec![TriggerEventKind::Enter]);
    Ok(())
}

#[test]
fn reversal_resumes_from_current_value() -> Result<()> {
    let section = SectionSpec::new("hero")
        .with_element(ElementSpec::new("about", 1200.0, 400.0))
        .with_timeline(SectionTimelineSpec::triggered(
            TimelineSpec::new("slow-fade").with_step(
                StepSpec::new(["about"], shown())
                    .with_from(hidden())
                    .with_duration(1000.0)
                    .with_easing(EasingFunction::Linear),
            ),
            about_trigger()?,
        ));

    let mut stage = Stage::new(&config());
    stage.mount(&section)?;
    stage.step();

    let mut samples = vec![opacity(&stage, "about")];
    stage.scroll_to(800.0);
    for _ in 0..50 {
        stage.step();
        samples.push(opacity(&stage, "about"));
    }
    let at_reversal = *samples.last().unwrap_or(&0.0);
    assert!(at_reversal > 0.3 && at_reversal < 0.6);

    stage.scroll_to(200.0);
    stage.step();
    assert!((opacity(&stage, "about") - at_reversal).abs() < 1e-9);
    for _ in 0..100 {
        stage.step();
        samples.push(opacity(&stage, "about"));
    }

    // 10ms frames over a 1000ms linear fade move at most 0.01 per frame
    for pair in samples.windows(2) {
        assert!((pair[1] - pair[0]).abs() <= 0.01 + 1e-9, "jump {:?}", pair);
    }
    assert_eq!(opacity(&stage, "about"), 0.0);
    Ok(())
}

#[test]
fn retrigger_while_exiting_resumes_forward() -> Result<()> {
    let mut stage = Stage::new(&config());
    let handle = stage.mount(&about_section()?)?;
    stage.step();
    let timeline = stage
        .controller()
        .find("about-reveal")
        .expect("timeline created on mount");

    stage.scroll_to(800.0);
    stage.run_for(1200.0);
    assert_eq!(stage.timeline_state(timeline), Some(AnimationState::Active));

    stage.scroll_to(200.0);
    stage.run_for(200.0);
    assert_eq!(stage.timeline_state(timeline), Some(AnimationState::Exiting));
    let playhead = stage.controller().playhead(timeline).unwrap_or_default();

    stage.scroll_to(800.0);
    stage.step();
    assert_eq!(stage.timeline_state(timeline), Some(AnimationState::Entering));
    assert_eq!(stage.controller().playhead(timeline), Some(playhead));
    assert_eq!(stage.controller().active_playbacks(), 1);

    stage.run_for(2000.0);
    assert_eq!(stage.timeline_state(timeline), Some(AnimationState::Active));
    assert!(stage.unmount(&handle));
    Ok(())
}

#[test]
fn missing_target_is_skipped() -> Result<()> {
    let section = SectionSpec::new("projects")
        .with_element(ElementSpec::new("about", 1200.0, 400.0))
        .with_timeline(SectionTimelineSpec::triggered(
            TimelineSpec::new("projects-reveal").with_step(
                StepSpec::new(["ghost", "about"], shown())
                    .with_from(hidden())
                    .with_duration(200.0)
                    .with_stagger(50.0),
            ),
            about_trigger()?,
        ));

    let mut stage = Stage::new(&config());
    stage.mount(&section)?;
    stage.step();
    stage.scroll_to(800.0);
    stage.run_for(1000.0);

    let events = stage.drain_events();
    assert!(events.iter().all(|q| match &q.event {
        StageEvent::Timeline(event) => event.element().map_or(true, |e| e.as_str() != "ghost"),
        _ => true,
    }));
    assert!(
        events
            .iter()
            .any(|q| matches!(q.event, StageEvent::Timeline(TimelineEvent::Completed { .. })))
    );
    assert_eq!(opacity(&stage, "about"), 1.0);
    assert!(!stage.surface().is_attached(&ElementId::new("ghost")));
    Ok(())
}

#[test]
fn element_removed_mid_playback_is_skipped() -> Result<()> {
    let mut stage = Stage::new(&config());
    stage.mount(&about_section()?)?;
    stage.step();
    stage.scroll_to(800.0);
    stage.run_for(100.0);

    assert!(stage.detach_element(&ElementId::new("card-2")));
    stage.run_for(2000.0);

    let events = stage.drain_events();
    assert!(!events.iter().any(|q| matches!(
        &q.event,
        StageEvent::Timeline(TimelineEvent::TweenStarted { element, .. }) if element.as_str() == "card-2"
    )));
    assert_eq!(opacity(&stage, "card-3"), 1.0);
    Ok(())
}

#[test]
fn resize_reevaluates_windows() -> Result<()> {
    let mut stage = Stage::new(&config());
    stage.mount(&about_section()?)?;
    stage.scroll_to(450.0);
    stage.step();
    stage.drain_events();

    // Taller viewport: start becomes 1200 - 0.7 * 1200 = 360, so 450 is inside
    stage.resize(reveal_scene::Viewport::new(1200.0, 4000.0));
    stage.step();
    assert_eq!(trigger_kinds(&stage.drain_events()), vec![TriggerEventKind::Enter]);
    Ok(())
}

#[test]
fn events_serialize_as_json_lines() -> Result<()> {
    let mut stage = Stage::new(&config());
    stage.mount(&about_section()?)?;
    stage.scroll_to(800.0);
    stage.run_for(100.0);

    for event in stage.drain_events() {
        let line = serde_json::to_string(&event)?;
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line)?;
        assert!(value.get("seq").is_some());
        assert!(value["event"].get("source").is_some());
    }
    Ok(())
}
