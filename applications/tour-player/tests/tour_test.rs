//! Tour playback through the engine and the simulated backend

use std::collections::HashMap;
use std::time::Duration;
use tour_player::{tour, SimulatedBackend, SimulationOptions, TourManifest, TourOutcome, TourStop};
use tour_playback::{
    backend_channel, store, BackendEvent, BackendMessage, EngineConfig, KeyValueStore,
    MemoryStore, PlaybackEngine, PlaybackState, RequestId,
};

fn manifest() -> TourManifest {
    TourManifest {
        id: "old-town".to_string(),
        title: "Old Town Walk".to_string(),
        stops: vec![
            TourStop {
                id: "gate".to_string(),
                title: "Main Gate".to_string(),
                audio: "audio/gate.mp3".to_string(),
                duration: Some(4.0),
            },
            TourStop {
                id: "square".to_string(),
                title: "Market Square".to_string(),
                audio: "audio/square.mp3".to_string(),
                duration: Some(6.0),
            },
        ],
    }
}

fn catalog(manifest: &TourManifest) -> HashMap<String, f64> {
    manifest
        .stops
        .iter()
        .filter_map(|stop| stop.duration.map(|d| (stop.audio.clone(), d)))
        .collect()
}

fn options() -> SimulationOptions {
    SimulationOptions {
        step: Duration::from_millis(500),
        speed: 1.0,
    }
}

/// Store whose contents can be read back after the engine took ownership
#[derive(Clone, Default)]
struct SharedStore(std::sync::Arc<std::sync::Mutex<MemoryStore>>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key)
    }

    fn set(&mut self, key: &str, value: String) {
        self.0.lock().unwrap().set(key, value);
    }
}

#[tokio::test(start_paused = true)]
async fn test_simulated_device_reports_lifecycle() {
    let (events_tx, mut events_rx) = backend_channel();
    let mut catalog = HashMap::new();
    catalog.insert("a.mp3".to_string(), 1.0);

    let (mut backend, device) = SimulatedBackend::spawn(catalog, events_tx, options());
    let request = RequestId::new(1);

    tour_playback::MediaBackend::load(&mut backend, request, "a.mp3", Default::default());
    tour_playback::MediaBackend::play(&mut backend, request);

    let mut received = Vec::new();
    while let Some(message) = events_rx.recv().await {
        assert_eq!(message.request, request);
        let ended = message.event == BackendEvent::Ended;
        received.push(message.event);
        if ended {
            break;
        }
    }

    assert_eq!(
        received,
        vec![
            BackendEvent::Ready { duration: 1.0 },
            BackendEvent::PlayStarted,
            BackendEvent::Tick {
                position: 0.5,
                duration: None
            },
            BackendEvent::Tick {
                position: 1.0,
                duration: None
            },
            BackendEvent::Ended,
        ]
    );

    drop(backend);
    device.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unknown_source_reports_error() {
    let (events_tx, mut events_rx) = backend_channel();
    let (mut backend, _device) = SimulatedBackend::spawn(HashMap::new(), events_tx, options());

    tour_playback::MediaBackend::load(
        &mut backend,
        RequestId::new(7),
        "missing.mp3",
        Default::default(),
    );

    let message: BackendMessage = events_rx.recv().await.unwrap();
    assert_eq!(message.request, RequestId::new(7));
    assert!(matches!(message.event, BackendEvent::Error(_)));
}

#[tokio::test(start_paused = true)]
async fn test_tour_plays_to_completion() {
    let manifest = manifest();
    let (events_tx, events_rx) = backend_channel();
    let (backend, _device) = SimulatedBackend::spawn(catalog(&manifest), events_tx, options());

    let shared = SharedStore::default();
    let engine = PlaybackEngine::builder(EngineConfig::default(), backend, events_rx)
        .store(shared.clone())
        .start()
        .unwrap();
    let player = engine.handle();

    tour::start(&player, manifest.tracks()).unwrap();
    let outcome = tour::follow(&player).await;

    assert_eq!(outcome, TourOutcome::Completed);
    let snapshot = player.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Ended);
    assert_eq!(snapshot.current_track.unwrap().id, "square");
    assert_eq!(snapshot.position, 6.0);
    assert_eq!(snapshot.history.len(), 2);

    engine.shutdown().await;

    let state = store::load_state(&shared).unwrap();
    let progress = &state.tour_progress["old-town"];
    assert_eq!(
        progress.completed_segments.iter().collect::<Vec<_>>(),
        vec!["gate", "square"]
    );
    assert_eq!(state.track_progress.get("gate"), Some(&4.0));
}

#[tokio::test(start_paused = true)]
async fn test_missing_audio_is_skipped() {
    let manifest = manifest();
    let mut catalog = catalog(&manifest);
    catalog.remove("audio/gate.mp3");

    let (events_tx, events_rx) = backend_channel();
    let (backend, _device) = SimulatedBackend::spawn(catalog, events_tx, options());
    let engine = PlaybackEngine::builder(EngineConfig::default(), backend, events_rx)
        .start()
        .unwrap();
    let player = engine.handle();

    tour::start(&player, manifest.tracks()).unwrap();
    let outcome = tour::follow(&player).await;

    assert_eq!(outcome, TourOutcome::Completed);
    assert_eq!(player.snapshot().current_track.unwrap().id, "square");

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_sleep_timer_interrupts_tour() {
    let manifest = TourManifest {
        stops: vec![TourStop {
            duration: Some(600.0),
            ..manifest().stops[0].clone()
        }],
        ..manifest()
    };

    let (events_tx, events_rx) = backend_channel();
    let (backend, _device) = SimulatedBackend::spawn(catalog(&manifest), events_tx, options());
    let engine = PlaybackEngine::builder(EngineConfig::default(), backend, events_rx)
        .start()
        .unwrap();
    let player = engine.handle();

    player.start_sleep_timer(1).unwrap();
    tour::start(&player, manifest.tracks()).unwrap();
    let outcome = tour::follow(&player).await;

    assert_eq!(outcome, TourOutcome::SleepTimerExpired);
    let snapshot = player.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Paused);
    assert!(snapshot.position < 600.0);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_missing_middle_stop_does_not_end_tour() {
    let mut manifest = manifest();
    manifest.stops.push(TourStop {
        id: "tower".to_string(),
        title: "Clock Tower".to_string(),
        audio: "audio/tower.mp3".to_string(),
        duration: Some(3.0),
    });
    let mut catalog = catalog(&manifest);
    catalog.remove("audio/square.mp3");

    let (events_tx, events_rx) = backend_channel();
    let (backend, _device) = SimulatedBackend::spawn(catalog, events_tx, options());
    let engine = PlaybackEngine::builder(EngineConfig::default(), backend, events_rx)
        .start()
        .unwrap();
    let player = engine.handle();

    tour::start(&player, manifest.tracks()).unwrap();
    let outcome = tour::follow(&player).await;

    assert_eq!(outcome, TourOutcome::Completed);
    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_track.unwrap().id, "tower");
    assert_eq!(snapshot.state, PlaybackState::Ended);

    engine.shutdown().await;
}
