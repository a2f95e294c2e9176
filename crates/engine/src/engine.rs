//! Acquisition Engine: owns a worker thread, drives the digitizer in
//! rapid-block loops, and turns raw captures into Events.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver as ControlReceiver, Sender as ControlSender, TryRecvError};

use daq_driver::{BindAction, ChannelConfig, DigitizerDriver, PollStatus};
use daq_types::channel::Channel;
use daq_types::error::CoreError;
use daq_types::event::Event;
use daq_types::notify::{EngineState, Notification, Waveform};
use daq_types::scope::ScopeSettings;
use daq_types::state::RetentionLimits;
use daq_types::trigger::TriggerSpec;

use crate::analyzer::analyze_waveform;
use crate::control::ControlMessage;
use crate::store::EventStore;

/// Adaptive poll interval cap.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// No more than one waveform emission per ~333 ms.
const WAVEFORM_THROTTLE: Duration = Duration::from_millis(333);

/// Handle to a running acquisition engine. Dropping it stops the worker
/// thread (the control channel disconnects, which the worker treats as
/// a shutdown request).
pub struct AcquisitionEngine {
    // `Option` so `shutdown`/`Drop` can drop the sender before joining:
    // a worker parked in Stopped/Paused's blocking `recv()` only wakes
    // up on a new message or on every sender disconnecting.
    control_tx: Option<ControlSender<ControlMessage>>,
    notifications: flume::Receiver<Notification>,
    store: EventStore,
    worker: Option<JoinHandle<()>>,
}

impl AcquisitionEngine {
    /// Open and program the device once (channels, timebase, trigger),
    /// then spawn the worker thread in the Stopped state.
    pub fn spawn(
        mut driver: Box<dyn DigitizerDriver>,
        trigger_spec: TriggerSpec,
        retention: RetentionLimits,
        store: EventStore,
    ) -> Result<Self, CoreError> {
        trigger_spec.validate()?;

        let info = driver.open()?;
        log::info!(
            "opened {} digitizer, serial {}, {}-bit ADC",
            info.family,
            info.serial,
            (info.max_adc as f64).log2().ceil() as u32
        );
        driver.configure_channels(ChannelConfig::default())?;
        let settings = driver.resolve_timebase(
            daq_driver::consts::TARGET_PRE_NS,
            daq_driver::consts::TARGET_POST_NS,
            Channel::ALL.len(),
        )?;
        driver.configure_trigger(&trigger_spec, &settings)?;

        let batch_size = match driver.family() {
            daq_driver::DeviceFamily::Model3000 => daq_driver::consts::BATCH_SIZE_3000,
            daq_driver::DeviceFamily::Model6000 => daq_driver::consts::BATCH_SIZE_6000,
        };

        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let (notify_tx, notify_rx) = flume::unbounded();

        let worker_store = store.clone();
        let worker = thread::spawn(move || {
            run_worker(
                driver,
                settings,
                batch_size,
                retention,
                worker_store,
                control_rx,
                notify_tx,
            );
        });

        Ok(Self {
            control_tx: Some(control_tx),
            notifications: notify_rx,
            store,
            worker: Some(worker),
        })
    }

    fn send(&self, message: ControlMessage) {
        if let Some(tx) = &self.control_tx {
            let _ = tx.send(message);
        }
    }

    pub fn pause(&self) {
        self.send(ControlMessage::Pause);
    }

    pub fn resume(&self) {
        self.send(ControlMessage::Resume);
    }

    pub fn stop(&self) {
        self.send(ControlMessage::Stop);
    }

    pub fn restart(&self) {
        self.send(ControlMessage::Restart);
    }

    pub fn notifications(&self) -> &flume::Receiver<Notification> {
        &self.notifications
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Request a stop and block until the worker thread exits. Drops
    /// the control sender before joining so a worker parked in
    /// Stopped/Paused wakes on disconnection rather than blocking
    /// forever.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.control_tx.take() {
            let _ = tx.send(ControlMessage::Stop);
            drop(tx);
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for AcquisitionEngine {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Some(tx) = self.control_tx.take() {
                let _ = tx.send(ControlMessage::Stop);
                drop(tx);
            }
            let _ = worker.join();
        }
    }
}

struct RunClock {
    run_start: Instant,
    paused_duration: Duration,
    pause_started_at: Option<Instant>,
}

impl RunClock {
    fn new() -> Self {
        Self {
            run_start: Instant::now(),
            paused_duration: Duration::ZERO,
            pause_started_at: None,
        }
    }

    fn pause(&mut self) {
        self.pause_started_at = Some(Instant::now());
    }

    fn resume(&mut self) {
        if let Some(started) = self.pause_started_at.take() {
            self.paused_duration += started.elapsed();
        }
    }

    /// Elapsed wall-clock time since the run started, excluding Paused
    /// intervals. Backs auto-stop.
    fn elapsed_running_secs(&self) -> f64 {
        (self.run_start.elapsed() - self.paused_duration).as_secs_f64()
    }
}

#[allow(clippy::too_many_arguments)]
fn run_worker(
    mut driver: Box<dyn DigitizerDriver>,
    settings: ScopeSettings,
    batch_size: usize,
    retention: RetentionLimits,
    store: EventStore,
    control_rx: ControlReceiver<ControlMessage>,
    notify_tx: flume::Sender<Notification>,
) {
    let mut state = EngineState::Stopped;
    let mut segments_ready = false;
    let mut backing: Vec<Vec<Vec<i16>>> = Vec::new();
    let mut clock = RunClock::new();
    let mut storage_warned = false;
    let mut last_waveform_emit = Instant::now() - WAVEFORM_THROTTLE;
    let mut next_event_id_hint = 0u64;

    loop {
        match state {
            EngineState::Stopped => match control_rx.recv() {
                Ok(ControlMessage::Resume) | Ok(ControlMessage::Restart) => {
                    if let Err(e) = enter_running(
                        &mut driver,
                        &settings,
                        batch_size,
                        &mut segments_ready,
                        &mut backing,
                    ) {
                        notify_tx.send(Notification::AcquisitionError(e.to_string())).ok();
                        continue;
                    }
                    store.clear();
                    next_event_id_hint = 0;
                    clock = RunClock::new();
                    storage_warned = false;
                    state = EngineState::Running;
                    notify_tx.send(Notification::StateChanged(state)).ok();
                }
                Ok(ControlMessage::Pause) | Ok(ControlMessage::Stop) => {}
                Err(_) => return,
            },
            EngineState::Paused => match control_rx.recv() {
                Ok(ControlMessage::Resume) => {
                    clock.resume();
                    state = EngineState::Running;
                    notify_tx.send(Notification::StateChanged(state)).ok();
                }
                Ok(ControlMessage::Restart) => {
                    store.clear();
                    next_event_id_hint = 0;
                    clock = RunClock::new();
                    storage_warned = false;
                    state = EngineState::Running;
                    notify_tx.send(Notification::StateChanged(state)).ok();
                }
                Ok(ControlMessage::Stop) => {
                    let _ = driver.stop();
                    state = EngineState::Stopped;
                    notify_tx.send(Notification::StateChanged(state)).ok();
                }
                Ok(ControlMessage::Pause) => {}
                Err(_) => return,
            },
            EngineState::Running => {
                match control_rx.try_recv() {
                    Ok(ControlMessage::Stop) => {
                        let _ = driver.stop();
                        state = EngineState::Stopped;
                        notify_tx.send(Notification::StateChanged(state)).ok();
                        continue;
                    }
                    Ok(ControlMessage::Pause) => {
                        clock.pause();
                        state = EngineState::Paused;
                        notify_tx.send(Notification::StateChanged(state)).ok();
                        continue;
                    }
                    Ok(ControlMessage::Restart) => {
                        store.clear();
                        next_event_id_hint = 0;
                        clock = RunClock::new();
                        storage_warned = false;
                        continue;
                    }
                    Ok(ControlMessage::Resume) => {}
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => return,
                }

                match run_iteration(
                    &mut driver,
                    &settings,
                    batch_size,
                    &mut backing,
                    &control_rx,
                ) {
                    Ok(Some(mut events)) => {
                        let batch_timestamp = clock.elapsed_running_secs();
                        for event in &mut events {
                            event.timestamp = batch_timestamp;
                        }
                        let count = events.len();
                        let outcome = store.add_batch(events);
                        next_event_id_hint += outcome.appended as u64;

                        if let Some(waveform) = representative_waveform(&backing, &settings) {
                            if last_waveform_emit.elapsed() >= WAVEFORM_THROTTLE {
                                notify_tx
                                    .send(Notification::WaveformReady(std::sync::Arc::new(waveform)))
                                    .ok();
                                last_waveform_emit = Instant::now();
                            }
                        }

                        let events_per_second = if count > 0 {
                            count as f64 / MAX_POLL_INTERVAL.as_secs_f64().max(f64::EPSILON)
                        } else {
                            0.0
                        };
                        notify_tx
                            .send(Notification::BatchComplete {
                                count,
                                events_per_second,
                            })
                            .ok();

                        if auto_stop_reached(&retention, &clock, store.size()) {
                            clock.pause();
                            state = EngineState::Paused;
                            notify_tx.send(Notification::StateChanged(state)).ok();
                        }

                        let fill_fraction = store.fill_fraction();
                        if fill_fraction >= 0.9 {
                            if !storage_warned {
                                notify_tx
                                    .send(Notification::StorageWarning { fill_fraction })
                                    .ok();
                                storage_warned = true;
                            }
                        } else {
                            storage_warned = false;
                        }
                    }
                    Ok(None) => {
                        // cancellation observed mid-poll; the outer match
                        // above will pick up the control message next
                        // time around the loop.
                    }
                    Err(e) => {
                        notify_tx.send(Notification::AcquisitionError(e.to_string())).ok();
                        state = EngineState::Stopped;
                        notify_tx.send(Notification::StateChanged(state)).ok();
                    }
                }
            }
        }
    }
}

/// Allocate segments and bind buffers once, the first time the engine
/// ever enters Running. Restart reuses the existing bindings rather
/// than re-allocating (see DESIGN.md).
fn enter_running(
    driver: &mut Box<dyn DigitizerDriver>,
    settings: &ScopeSettings,
    batch_size: usize,
    segments_ready: &mut bool,
    backing: &mut Vec<Vec<Vec<i16>>>,
) -> Result<(), CoreError> {
    if *segments_ready {
        return Ok(());
    }
    driver.allocate_segments(batch_size)?;
    driver.set_capture_count(batch_size)?;

    let total_samples = settings.total_samples();
    *backing = vec![vec![vec![0i16; total_samples]; batch_size]; Channel::ALL.len()];

    for channel in Channel::ALL {
        for segment in 0..batch_size {
            let action = if segment == 0 {
                BindAction::ClearThenAdd
            } else {
                BindAction::Set
            };
            let buffer = daq_driver::BoundBuffer::from_slice(&mut backing[channel.index()][segment]);
            driver.bind_buffers(channel, segment, buffer, action)?;
        }
    }
    *segments_ready = true;
    Ok(())
}

/// Run one rapid-block iteration. Returns `Ok(None)` if cancellation was
/// observed mid-poll (caller re-checks the control channel).
fn run_iteration(
    driver: &mut Box<dyn DigitizerDriver>,
    settings: &ScopeSettings,
    batch_size: usize,
    backing: &mut [Vec<Vec<i16>>],
    control_rx: &ControlReceiver<ControlMessage>,
) -> Result<Option<Vec<Event>>, CoreError> {
    driver.run_block(settings)?;

    let mut poll_interval = Duration::from_micros(1);
    loop {
        if !control_rx.is_empty() {
            return Ok(None);
        }
        match driver.poll_ready()? {
            PollStatus::Ready => break,
            PollStatus::NotReady => {
                thread::sleep(poll_interval);
                poll_interval = (poll_interval * 2).min(MAX_POLL_INTERVAL);
            }
        }
    }

    driver.bulk_download(0, batch_size - 1)?;

    let mut events = Vec::with_capacity(batch_size);
    for segment in 0..batch_size {
        let mut pulses = [daq_types::event::ChannelPulse::absent(0.0); 4];
        for channel in Channel::ALL {
            let samples_mv: Vec<f64> = backing[channel.index()][segment]
                .iter()
                .map(|&code| daq_driver::convert::code_to_mv(code, settings.range_mv, settings.max_adc))
                .collect();
            pulses[channel.index()] =
                analyze_waveform(&samples_mv, settings.pre_samples, settings.sample_interval_ns);
        }
        // event_id is assigned by the store on insertion; timestamp is
        // stamped by the caller once the whole batch's elapsed time is
        // known (every event in a rapid-block batch is downloaded
        // together, so they share one acquisition-relative timestamp).
        events.push(Event::new(0, 0.0, pulses));
    }
    Ok(Some(events))
}

fn representative_waveform(backing: &[Vec<Vec<i16>>], settings: &ScopeSettings) -> Option<Waveform> {
    if backing.is_empty() {
        return None;
    }
    let mut channel_samples_mv: [std::sync::Arc<[f32]>; 4] = [
        std::sync::Arc::from(Vec::<f32>::new()),
        std::sync::Arc::from(Vec::<f32>::new()),
        std::sync::Arc::from(Vec::<f32>::new()),
        std::sync::Arc::from(Vec::<f32>::new()),
    ];
    for channel in Channel::ALL {
        let first_segment = backing[channel.index()].first()?;
        let mv: Vec<f32> = first_segment
            .iter()
            .map(|&code| daq_driver::convert::code_to_mv(code, settings.range_mv, settings.max_adc) as f32)
            .collect();
        channel_samples_mv[channel.index()] = std::sync::Arc::from(mv);
    }
    Some(Waveform { channel_samples_mv })
}

fn auto_stop_reached(retention: &RetentionLimits, clock: &RunClock, store_size: usize) -> bool {
    if let Some(limit) = retention.time_limit_secs {
        if clock.elapsed_running_secs() >= limit {
            return true;
        }
    }
    if let Some(limit) = retention.event_limit {
        if store_size as u64 >= limit {
            return true;
        }
    }
    false
}
