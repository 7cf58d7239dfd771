//! Transport state machine
//!
//! Owns the active soundtrack, the master playback clock, and the fade
//! scheduler, and is the only component allowed to start or stop
//! players. All mutation happens on one logical timeline: the owner
//! thread feeds commands and ticks in, so no locks guard any of this
//! state.
//!
//! Failure semantics: a track whose source failed to bind simply has no
//! player and is excluded from every operation. Transport calls never
//! return errors to the caller; the engine degrades to silence and
//! stays usable.

use std::sync::Arc;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::mix::{self, FadeRamp};
use crate::nowplaying::{MediaCommand, NowPlayingPublisher, NowPlayingState};
use crate::types::{Mph, PlayState, FADE_STEPS};

use super::atomics::TransportAtomics;
use super::clock::PlaybackClock;
use super::command::TransportCommand;
use super::lane::ActiveSoundtrack;
use super::sched::{Scheduler, TaskId, TaskKind};

/// The play/pause/rewind/switch state machine
pub struct TransportController {
    config: EngineConfig,
    state: PlayState,
    clock: PlaybackClock,
    current: Option<ActiveSoundtrack>,
    /// Last known speed; held across speed-source pauses so volumes
    /// never decay to "zero speed" just because samples stopped
    speed: Mph,
    sched: Scheduler,
    resync_task: Option<TaskId>,
    publisher: Box<dyn NowPlayingPublisher>,
    atomics: Arc<TransportAtomics>,
    last_publish: Option<Duration>,
}

impl TransportController {
    pub fn new(
        config: EngineConfig,
        publisher: Box<dyn NowPlayingPublisher>,
        atomics: Arc<TransportAtomics>,
    ) -> Self {
        Self {
            config,
            state: PlayState::Stopped,
            clock: PlaybackClock::new(),
            current: None,
            speed: 0.0,
            sched: Scheduler::new(),
            resync_task: None,
            publisher,
            atomics,
            last_publish: None,
        }
    }

    /// Current transport state
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Master playback time
    pub fn master_time(&self) -> Duration {
        self.clock.master()
    }

    /// The active soundtrack, if one has been set
    pub fn current(&self) -> Option<&ActiveSoundtrack> {
        self.current.as_ref()
    }

    /// Earliest pending deadline, for the owner loop's sleep
    pub fn next_deadline(&self) -> Option<Duration> {
        self.sched.next_deadline()
    }

    /// Apply one queued command
    pub fn handle_command(&mut self, now: Duration, command: TransportCommand) {
        match command {
            TransportCommand::Toggle => self.toggle(now),
            TransportCommand::Rewind => self.rewind(now),
            TransportCommand::SetSoundtrack(active) => {
                self.set_soundtrack(now, *active);
            }
            TransportCommand::Speed(mph) => self.on_speed(now, mph),
            TransportCommand::Media(cmd) => self.on_media(now, cmd),
            // Shutdown terminates the owner loop before reaching here
            TransportCommand::Shutdown => {}
        }
    }

    /// Run everything the scheduler has due at `now`
    pub fn tick(&mut self, now: Duration) {
        while let Some((id, kind)) = self.sched.pop_due(now) {
            match kind {
                TaskKind::Resync => self.resync(now),
                TaskKind::FadeStep { lane } => self.fade_step(lane, id),
            }
        }
    }

    /// Flip Stopped <-> Playing
    pub fn toggle(&mut self, now: Duration) {
        match self.state {
            PlayState::Stopped => self.enter_playing(now),
            PlayState::Playing => self.enter_stopped(now),
        }
    }

    /// Swap or refresh the active soundtrack
    ///
    /// Returns the previously active set so the host can release its
    /// players. A switch away from a playing soundtrack stops it fully,
    /// resets master time to zero, and starts the new set from the top;
    /// re-setting the current soundtrack while stopped refreshes the
    /// bound players without touching master time.
    pub fn set_soundtrack(
        &mut self,
        now: Duration,
        new: ActiveSoundtrack,
    ) -> Option<ActiveSoundtrack> {
        let same_identity = self
            .current
            .as_ref()
            .is_some_and(|cur| cur.id() == new.id());

        if same_identity && self.state.is_playing() {
            log::debug!("soundtrack {} already current and playing", new.id());
            return Some(new);
        }

        if same_identity {
            // Refresh players in place; master time survives
            let previous = self.current.replace(new);
            self.publish(now, true);
            return previous;
        }

        let was_playing = self.state.is_playing();
        if was_playing {
            self.enter_stopped(now);
        }
        // Master time belongs to the soundtrack identity: it dies with
        // the old set, along with any fades still draining against it.
        self.sched.clear();
        self.resync_task = None;
        self.clock.reset();
        self.atomics.set_master_time(Duration::ZERO);
        self.atomics.bump_soundtrack_serial();

        let previous = self.current.replace(new);
        log::info!(
            "soundtrack switched to {}",
            self.current.as_ref().map(|a| a.id().0.as_str()).unwrap_or("-")
        );

        if was_playing {
            self.enter_playing(now);
        } else {
            self.publish(now, true);
        }
        previous
    }

    /// A speed sample arrived
    ///
    /// Schedules a fade toward the new target for every sounding lane,
    /// superseding any fade already running there. Never changes
    /// transport state.
    pub fn on_speed(&mut self, now: Duration, mph: Mph) {
        self.speed = mph.max(0.0);
        self.atomics.set_speed(self.speed);

        if !self.state.is_playing() {
            return;
        }
        let Some(active) = self.current.as_mut() else {
            return;
        };

        let interval = self.config.fade() / FADE_STEPS;
        for (idx, lane) in active.lanes.iter_mut().enumerate() {
            if !lane.is_sounding() {
                continue;
            }
            let target = mix::target_gain(&lane.descriptor, lane.role, self.speed);

            // Last-scheduled-wins: the superseded ramp's remaining steps
            // are cancelled, not overwritten one by one
            if let Some(id) = lane.fade_task.take() {
                self.sched.cancel(id);
            }
            let from = lane.player.as_ref().map(|p| p.gain()).unwrap_or(lane.gain);
            lane.fade = Some(FadeRamp::new(from, target, FADE_STEPS));
            lane.fade_task = Some(self.sched.schedule_series(
                TaskKind::FadeStep { lane: idx },
                now + interval,
                interval,
                FADE_STEPS,
            ));
        }
    }

    /// Jump to the top of the soundtrack without interrupting playback
    pub fn rewind(&mut self, now: Duration) {
        self.clock.reset();
        self.atomics.set_master_time(Duration::ZERO);

        if self.state.is_playing() {
            if let Some(active) = self.current.as_mut() {
                for lane in &mut active.lanes {
                    if let Some(player) = lane.player.as_mut() {
                        if player.is_sounding() {
                            player.seek(Duration::ZERO);
                        }
                    }
                }
            }
        }
        self.publish(now, true);
    }

    /// Remote command from the media surface, guarded by current state
    pub fn on_media(&mut self, now: Duration, command: MediaCommand) {
        match (command, self.state) {
            (MediaCommand::Play, PlayState::Stopped) => self.toggle(now),
            (MediaCommand::Pause, PlayState::Playing) => self.toggle(now),
            (MediaCommand::Toggle, _) => self.toggle(now),
            (cmd, state) => {
                log::debug!("media command {:?} ignored in state {:?}", cmd, state);
            }
        }
    }

    fn enter_playing(&mut self, now: Duration) {
        let Some(active) = self.current.as_mut() else {
            log::debug!("toggle ignored: no soundtrack loaded");
            return;
        };

        let master = self.clock.master();
        let lead = self.config.start_lead();
        let speed = self.speed;

        for lane in &mut active.lanes {
            // A resume makes any fade left over from the previous play
            // session meaningless; the initial gain overwrites it
            if let Some(id) = lane.fade_task.take() {
                self.sched.cancel(id);
            }
            lane.fade = None;

            let Some(player) = lane.player.as_mut() else {
                continue;
            };
            player.set_looping(true);
            let gain = mix::target_gain(&lane.descriptor, lane.role, speed);
            player.set_gain(gain);
            lane.gain = gain;
            // Common near-future start keeps the stems in lock-step
            player.start(master, lead);
        }

        self.state = PlayState::Playing;
        let interval = self.config.resync_interval();
        self.resync_task = Some(self.sched.schedule_periodic(
            TaskKind::Resync,
            now + interval,
            interval,
        ));
        self.atomics.set_playing(true);
        self.publish(now, true);
    }

    fn enter_stopped(&mut self, now: Duration) {
        if let Some(active) = self.current.as_mut() {
            // Freeze master time at the sounding reference before
            // anything stops
            self.clock.capture(&active.lanes);
            for lane in &mut active.lanes {
                if let Some(player) = lane.player.as_mut() {
                    player.stop();
                }
            }
        }
        if let Some(id) = self.resync_task.take() {
            self.sched.cancel(id);
        }
        // In-flight fade series stay scheduled; each step gates on the
        // lane still sounding, so they drain as no-ops while paused

        self.state = PlayState::Stopped;
        self.atomics.set_playing(false);
        self.atomics.set_master_time(self.clock.master());
        self.publish(now, true);
    }

    fn resync(&mut self, now: Duration) {
        if !self.state.is_playing() {
            return;
        }
        let Some(active) = self.current.as_mut() else {
            return;
        };
        if self.clock.resync(&mut active.lanes) {
            self.atomics.set_master_time(self.clock.master());
            self.publish(now, false);
        }
    }

    fn fade_step(&mut self, lane_idx: usize, task: TaskId) {
        let Some(active) = self.current.as_mut() else {
            return;
        };
        let Some(lane) = active.lanes.get_mut(lane_idx) else {
            return;
        };
        if lane.fade_task != Some(task) {
            // A step from a superseded series that fired in the same
            // drain; its replacement owns the lane now
            return;
        }
        if !lane.is_sounding() {
            // Paused mid-fade: the step is a harmless no-op
            return;
        }

        let Some(ramp) = lane.fade.as_mut() else {
            return;
        };
        let gain = ramp.advance();
        let done = ramp.is_complete();
        if let Some(player) = lane.player.as_mut() {
            player.set_gain(gain);
        }
        lane.gain = gain;
        if done {
            lane.fade = None;
            lane.fade_task = None;
        }
    }

    /// Mirror state out to the now-playing surface
    ///
    /// Transport edges publish immediately; the resync path is rate
    /// limited so a millisecond tick does not spam the OS.
    fn publish(&mut self, now: Duration, force: bool) {
        if !force {
            let interval = self.config.nowplaying_interval();
            if let Some(last) = self.last_publish {
                if now < last + interval {
                    return;
                }
            }
        }
        self.last_publish = Some(now);

        let snapshot = self.current.as_ref().map(|active| NowPlayingState {
            title: active.soundtrack.title.clone(),
            status_text: NowPlayingState::status_for_speed(self.speed),
            elapsed: self.clock.master(),
            duration: active.duration(),
            artwork: active.soundtrack.artwork.clone(),
            playing: self.state.is_playing(),
        });
        match snapshot {
            Some(state) => self.publisher.publish(&state),
            None => self.publisher.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nowplaying::NoopPublisher;
    use crate::player::sim::{SimClock, SimDrift, SimPlayer};
    use crate::soundtrack::{Soundtrack, SoundtrackId, TrackDescriptor};
    use crate::transport::lane::Lane;
    use crate::types::TrackRole;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Keeps the engine timeline and the simulated audio clock in step
    struct Harness {
        clock: Arc<SimClock>,
        controller: TransportController,
        now: Duration,
    }

    impl Harness {
        fn new() -> Self {
            let clock = SimClock::new();
            let controller = TransportController::new(
                EngineConfig::default(),
                Box::new(NoopPublisher),
                Arc::new(TransportAtomics::new()),
            );
            Self {
                clock,
                controller,
                now: Duration::ZERO,
            }
        }

        /// Advance both clocks by `delta` and run due work
        fn step(&mut self, delta: Duration) {
            self.now += delta;
            self.clock.advance(delta);
            self.controller.tick(self.now);
        }

        fn soundtrack(
            &self,
            id: &str,
            tracks: &[(&str, f32, u32, u32)],
        ) -> (ActiveSoundtrack, Vec<SimDrift>) {
            let descriptors: Vec<TrackDescriptor> = tracks
                .iter()
                .map(|(name, vol, min, max)| TrackDescriptor {
                    source: format!("{name}.m4a"),
                    name: name.to_string(),
                    volume_percent: *vol,
                    min_speed: *min,
                    max_speed: *max,
                })
                .collect();
            let mut drifts = Vec::new();
            let lanes = descriptors
                .iter()
                .enumerate()
                .map(|(idx, descriptor)| {
                    let player = SimPlayer::new(ms(240_000), self.clock.clone());
                    drifts.push(player.drift_handle());
                    Lane::bound(
                        descriptor.clone(),
                        TrackRole::from_index(idx),
                        Box::new(player),
                    )
                })
                .collect();
            let active = ActiveSoundtrack {
                soundtrack: Soundtrack {
                    id: SoundtrackId(id.to_string()),
                    title: id.to_string(),
                    tracks: descriptors,
                    artwork: None,
                },
                lanes,
            };
            (active, drifts)
        }

        fn gain(&self, lane: usize) -> f32 {
            self.controller.current().unwrap().lanes[lane]
                .player
                .as_ref()
                .unwrap()
                .gain()
        }

        fn position(&self, lane: usize) -> Duration {
            self.controller.current().unwrap().lanes[lane]
                .player
                .as_ref()
                .unwrap()
                .position()
        }

        fn sounding(&self, lane: usize) -> bool {
            self.controller.current().unwrap().lanes[lane].is_sounding()
        }

        /// Walk time forward in millisecond ticks (resync cadence)
        fn run(&mut self, total: Duration) {
            let mut remaining = total;
            while !remaining.is_zero() {
                let delta = ms(1).min(remaining);
                self.step(delta);
                remaining -= delta;
            }
        }
    }

    const LEAD: Duration = Duration::from_millis(100);

    #[test]
    fn test_toggle_starts_all_lanes_in_lockstep() {
        let mut h = Harness::new();
        let (active, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0), ("drums", 0.0, 0, 40)]);
        h.controller.set_soundtrack(h.now, active);
        h.controller.toggle(h.now);

        assert_eq!(h.controller.state(), PlayState::Playing);
        // Nothing sounds until the common start deadline passes
        assert!(!h.sounding(0));
        assert!(!h.sounding(1));

        h.run(LEAD + ms(50));
        assert!(h.sounding(0));
        assert!(h.sounding(1));
        assert_eq!(h.position(0), h.position(1));
    }

    #[test]
    fn test_pause_resume_keeps_master_time() {
        // Scenario C: Playing -> Stopped -> Playing resumes, not restarts
        let mut h = Harness::new();
        let (active, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0)]);
        h.controller.set_soundtrack(h.now, active);
        h.controller.toggle(h.now);
        h.run(LEAD + ms(400));

        h.controller.toggle(h.now);
        assert_eq!(h.controller.state(), PlayState::Stopped);
        let captured = h.controller.master_time();
        assert_eq!(captured, ms(400));

        // Time passes while paused; master time must not move
        h.run(ms(250));
        assert_eq!(h.controller.master_time(), captured);

        h.controller.toggle(h.now);
        assert_eq!(h.controller.master_time(), captured);
        h.run(LEAD + ms(50));
        assert_eq!(h.controller.master_time(), captured + ms(50));
        assert_eq!(h.position(0), captured + ms(50));
    }

    #[test]
    fn test_switch_soundtrack_resets_master_time() {
        // Scenario D: switching away mid-play stops the old set and
        // zeroes master time before the new set starts
        let mut h = Harness::new();
        let (first, _) = h.soundtrack("first", &[("base", 0.0, 0, 0)]);
        let (second, _) = h.soundtrack("second", &[("base", 0.0, 0, 0)]);

        h.controller.set_soundtrack(h.now, first);
        h.controller.toggle(h.now);
        h.run(LEAD + ms(600));
        assert_eq!(h.controller.master_time(), ms(600));

        let previous = h.controller.set_soundtrack(h.now, second).unwrap();
        assert!(previous.lanes.iter().all(|l| !l.is_sounding()));
        assert_eq!(h.controller.master_time(), Duration::ZERO);

        // The switch happened while playing, so the new set starts from
        // the top after its own lead
        assert_eq!(h.controller.state(), PlayState::Playing);
        h.run(LEAD + ms(80));
        assert_eq!(h.controller.master_time(), ms(80));
    }

    #[test]
    fn test_set_same_soundtrack_while_playing_is_noop() {
        let mut h = Harness::new();
        let (active, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0)]);
        let (again, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0)]);

        h.controller.set_soundtrack(h.now, active);
        h.controller.toggle(h.now);
        h.run(LEAD + ms(300));

        h.controller.set_soundtrack(h.now, again);
        assert_eq!(h.controller.state(), PlayState::Playing);
        assert_eq!(h.controller.master_time(), ms(300));
        assert!(h.sounding(0));
    }

    #[test]
    fn test_refresh_same_soundtrack_while_stopped_keeps_master_time() {
        let mut h = Harness::new();
        let (active, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0)]);
        let (refreshed, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0)]);

        h.controller.set_soundtrack(h.now, active);
        h.controller.toggle(h.now);
        h.run(LEAD + ms(500));
        h.controller.toggle(h.now);
        assert_eq!(h.controller.master_time(), ms(500));

        h.controller.set_soundtrack(h.now, refreshed);
        assert_eq!(h.controller.state(), PlayState::Stopped);
        assert_eq!(h.controller.master_time(), ms(500));
    }

    #[test]
    fn test_rewind_repositions_without_stopping() {
        // Scenario E: master and every sounding cursor hit zero with no
        // audible gap
        let mut h = Harness::new();
        let (active, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0), ("drums", 0.0, 0, 40)]);
        h.controller.set_soundtrack(h.now, active);
        h.controller.toggle(h.now);
        h.run(LEAD + ms(800));

        h.controller.rewind(h.now);
        assert_eq!(h.controller.master_time(), Duration::ZERO);
        assert!(h.sounding(0));
        assert!(h.sounding(1));
        assert_eq!(h.position(0), Duration::ZERO);
        assert_eq!(h.position(1), Duration::ZERO);
    }

    #[test]
    fn test_resync_corrects_drifted_lane() {
        let mut h = Harness::new();
        let (active, drifts) =
            h.soundtrack("ride", &[("base", 0.0, 0, 0), ("drums", 0.0, 0, 40)]);
        h.controller.set_soundtrack(h.now, active);
        h.controller.toggle(h.now);
        h.run(LEAD + ms(200));

        drifts[1].drift(ms(30));
        assert_eq!(h.position(1), h.position(0) + ms(30));

        h.step(ms(1));
        assert_eq!(h.position(1), h.position(0));
        assert!(h.sounding(1));
    }

    #[test]
    fn test_initial_gains_use_last_known_speed() {
        let mut h = Harness::new();
        let (active, _) = h.soundtrack(
            "ride",
            &[("base", 0.0, 0, 0), ("drums", 100.0, 0, 80), ("pad", 0.0, 50, 60)],
        );
        h.controller.set_soundtrack(h.now, active);

        // Sample arrives before playback starts; toggle must honor it
        h.controller.on_speed(h.now, 40.0);
        h.controller.toggle(h.now);

        assert_eq!(h.gain(0), 1.0);
        assert_eq!(h.gain(1), 1.0); // 2.0 * 40/80
        assert_eq!(h.gain(2), 0.0); // below its window
    }

    #[test]
    fn test_speed_sample_fades_to_target() {
        let mut h = Harness::new();
        let (active, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0), ("drums", 100.0, 0, 80)]);
        h.controller.set_soundtrack(h.now, active);
        h.controller.toggle(h.now);
        h.run(LEAD + ms(10));
        assert_eq!(h.gain(1), 0.0); // no speed yet

        h.controller.on_speed(h.now, 40.0);
        // Half way through the fade the gain is strictly between
        h.run(ms(250));
        let mid = h.gain(1);
        assert!(mid > 0.0 && mid < 1.0, "mid-fade gain was {mid}");

        h.run(ms(300));
        assert_eq!(h.gain(1), 1.0);
        // Base lane target never moved
        assert_eq!(h.gain(0), 1.0);
    }

    #[test]
    fn test_newer_sample_supersedes_running_fade() {
        let mut h = Harness::new();
        let (active, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0), ("drums", 100.0, 0, 80)]);
        h.controller.set_soundtrack(h.now, active);
        h.controller.toggle(h.now);
        h.run(LEAD + ms(10));

        h.controller.on_speed(h.now, 80.0);
        h.run(ms(200)); // partway toward 2.0
        h.controller.on_speed(h.now, 20.0);
        h.run(ms(600));

        // Settled on the newer target, not the superseded one
        assert_eq!(h.gain(1), 0.5);
    }

    #[test]
    fn test_same_target_twice_settles_without_overshoot() {
        let mut h = Harness::new();
        let (active, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0), ("drums", 100.0, 0, 80)]);
        h.controller.set_soundtrack(h.now, active);
        h.controller.toggle(h.now);
        h.run(LEAD + ms(10));

        h.controller.on_speed(h.now, 40.0);
        h.controller.on_speed(h.now, 40.0);

        let mut peak: f32 = 0.0;
        for _ in 0..700 {
            h.step(ms(1));
            peak = peak.max(h.gain(1));
        }
        assert_eq!(h.gain(1), 1.0);
        assert!(peak <= 1.0, "gain overshot to {peak}");
    }

    #[test]
    fn test_gains_hold_while_speed_source_is_silent() {
        let mut h = Harness::new();
        let (active, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0), ("drums", 100.0, 0, 80)]);
        h.controller.set_soundtrack(h.now, active);
        h.controller.toggle(h.now);
        h.run(LEAD + ms(10));

        h.controller.on_speed(h.now, 40.0);
        h.run(ms(600));
        assert_eq!(h.gain(1), 1.0);

        // Speed source pauses; volumes hold, they do not decay to zero
        h.run(ms(5_000));
        assert_eq!(h.gain(1), 1.0);
    }

    #[test]
    fn test_media_commands_are_state_guarded() {
        let mut h = Harness::new();
        let (active, _) = h.soundtrack("ride", &[("base", 0.0, 0, 0)]);
        h.controller.set_soundtrack(h.now, active);

        h.controller.on_media(h.now, MediaCommand::Pause);
        assert_eq!(h.controller.state(), PlayState::Stopped);

        h.controller.on_media(h.now, MediaCommand::Play);
        assert_eq!(h.controller.state(), PlayState::Playing);

        h.controller.on_media(h.now, MediaCommand::Play);
        assert_eq!(h.controller.state(), PlayState::Playing);

        h.controller.on_media(h.now, MediaCommand::Toggle);
        assert_eq!(h.controller.state(), PlayState::Stopped);
    }

    #[test]
    fn test_unbound_lane_is_excluded_everywhere() {
        let mut h = Harness::new();
        let (mut active, _) =
            h.soundtrack("ride", &[("base", 0.0, 0, 0), ("ghost", 100.0, 0, 80)]);
        // Source failed to bind: lane carried but playerless
        active.lanes[1].player = None;

        h.controller.set_soundtrack(h.now, active);
        h.controller.toggle(h.now);
        h.run(LEAD + ms(100));

        assert!(h.sounding(0));
        assert!(!h.controller.current().unwrap().lanes[1].is_sounding());

        h.controller.on_speed(h.now, 40.0);
        h.run(ms(600));
        h.controller.rewind(h.now);
        h.controller.toggle(h.now);
        // Nothing panicked; the bound lane did all the work
        assert_eq!(h.controller.state(), PlayState::Stopped);
    }

    #[test]
    fn test_toggle_without_soundtrack_stays_stopped() {
        let mut h = Harness::new();
        h.controller.toggle(h.now);
        assert_eq!(h.controller.state(), PlayState::Stopped);
    }
}
