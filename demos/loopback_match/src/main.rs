//! Loopback Match
//!
//! Runs a host and two joiners in one process over in-memory pipes:
//! - Joiners seat themselves, ready up, and the host starts the match
//! - Joiner A steers its participant; joiner B watches it move through interpolation
//! - After the round the host drafts a reward for A, one for the bot, then a world card
//! - Finally the host leaves and the joiners reset
//!
//! Set `RUST_LOG=debug` to see dropped and stale messages.

use melee_core::{Clock, GameRng, JoinerIndex, ManualClock, Millis, ParticipantId, Roster, Vec2};
use melee_draft::{BotDecider, EffectApplier};
use melee_netcode::{
    decode_entities, encode_entities, Choice, Connection, EntityState, InputFrame, MoveKeys,
    OfferKind, RenderFrame, Renderer, Snapshot, StateCodec,
};
use melee_session::{HostSession, JoinerSession, SessionConfig, Simulation};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const TICK_MS: Millis = 10;
const MATCH_END_MS: Millis = 4_500;

const A: JoinerIndex = JoinerIndex(0);
const B: JoinerIndex = JoinerIndex(1);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let config = load_config()?;
    info!(?config, "session config");

    let clock = ManualClock::new(0);
    let mut host = HostSession::new(config.clone(), Arena::default())
        .with_applier(LoggedEffects)
        .with_decider(RandomDecider(GameRng::new(config.bot_seed)));
    let mut joiners = BTreeMap::from([
        (A, JoinerSession::new(config.clone(), A)),
        (B, JoinerSession::new(config, B)),
    ]);
    let downlinks: BTreeMap<JoinerIndex, Pipe> =
        BTreeMap::from([(A, Pipe::default()), (B, Pipe::default())]);
    let uplinks: BTreeMap<JoinerIndex, Pipe> =
        BTreeMap::from([(A, Pipe::default()), (B, Pipe::default())]);

    // Lobby
    host.seat_host("Ash", "#e07a5f")?;
    let vex = host.join(A, "Vex", "#3d405b")?;
    host.join(B, "Rook", "#81b29a")?;
    let bot = host.add_bot("Tin", "#999999")?;
    host.tick(clock.now());
    pump(&mut host, &mut joiners, &downlinks, &uplinks, clock.now());
    for joiner in joiners.values_mut() {
        joiner.tick(clock.now());
    }

    host.set_ready(true)?;
    for joiner in joiners.values_mut() {
        joiner.set_ready(true)?;
    }
    pump(&mut host, &mut joiners, &downlinks, &uplinks, clock.now());
    host.start_match()?;

    // Play
    let mut renderer = SpectatorView::default();
    while clock.now() < MATCH_END_MS {
        let now = clock.now();

        if let Some(a) = joiners.get_mut(&A) {
            let keys = MoveKeys {
                right: now < 1_000,
                down: now >= 1_000,
                ..MoveKeys::default()
            };
            a.send_input(keys, Vec2::new(1.0, 0.0), now % 500 == 0, false);
        }

        if now == 1_500 {
            info!("round over, drafting");
            host.offer_reward(vex, reward_cards(), now)?;
            host.offer_reward(bot, reward_cards(), now)?;
            host.offer_world(world_cards(), now)?;
        }
        if let Some(a) = joiners.get_mut(&A) {
            if a.draft().is_local_chooser() {
                match now {
                    1_600 => a.hover(Some(0))?,
                    1_700 => a.hover(Some(2))?,
                    1_800 => a.pick("Bulwark", now)?,
                    _ => {}
                }
            }
        }
        if host.draft().is_local_chooser() && host.draft().open_offer_ref().is_some() {
            if host.draft().hover_index().is_none() {
                host.hover(Some(1))?;
            } else {
                host.pick("Low Gravity", now)?;
            }
        }

        host.tick(now);
        pump(&mut host, &mut joiners, &downlinks, &uplinks, now);
        for joiner in joiners.values_mut() {
            joiner.tick(now);
        }
        if now % 250 == 0 {
            if let Some(b) = joiners.get(&B) {
                b.render(now, &mut renderer);
            }
        }

        clock.advance(TICK_MS);
    }

    info!(
        steps = host.simulation().steps,
        frames = renderer.frames,
        "match over"
    );

    // The host goes away
    for joiner in joiners.values_mut() {
        let notice = joiner.on_host_departed();
        info!(joiner = %joiner.joiner(), ?notice, "joiner reset");
    }

    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(log_fmt::layer().with_target(false))
        .init();
}

fn load_config() -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let paths = [
        "demos/loopback_match/data/session.ron",
        "data/session.ron",
        "../data/session.ron",
    ];
    for path in &paths {
        if Path::new(path).exists() {
            return Ok(SessionConfig::load(path)?);
        }
    }
    warn!("no session.ron found, using defaults");
    Ok(SessionConfig::default())
}

/// Move every queued message one hop in each direction
fn pump(
    host: &mut HostSession<Arena>,
    joiners: &mut BTreeMap<JoinerIndex, JoinerSession>,
    downlinks: &BTreeMap<JoinerIndex, Pipe>,
    uplinks: &BTreeMap<JoinerIndex, Pipe>,
    now: Millis,
) {
    for (index, joiner) in joiners.iter_mut() {
        if let Some(uplink) = uplinks.get(index) {
            if let Err(err) = joiner.flush(uplink) {
                warn!(joiner = %index, %err, "uplink send failed");
            }
            while let Ok(Some(bytes)) = uplink.recv() {
                host.receive(*index, &bytes, now);
            }
        }
    }

    host.flush(downlinks);
    for (index, joiner) in joiners.iter_mut() {
        if let Some(downlink) = downlinks.get(index) {
            while let Ok(Some(bytes)) = downlink.recv() {
                joiner.receive(&bytes, now);
            }
        }
    }
}

fn reward_cards() -> Vec<Choice> {
    vec![
        Choice::new("Glass Cannon", "Double damage, half health").with_field("rarity", "rare"),
        Choice::new("Quickstep", "Dash cooldown -30%").with_field("rarity", "common"),
        Choice::new("Bulwark", "Block the first hit each round").with_field("rarity", "uncommon"),
    ]
}

fn world_cards() -> Vec<Choice> {
    vec![
        Choice::new("Fog", "Vision radius halved"),
        Choice::new("Low Gravity", "Projectiles arc less"),
    ]
}

// ============================================================================
// Collaborators
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Projectile {
    owner: ParticipantId,
    origin: Vec2,
    fired_at: Millis,
}

struct ProjectileCodec;

impl StateCodec for ProjectileCodec {
    type Entity = Projectile;

    fn kind(&self) -> &str {
        "projectile"
    }

    fn serialize(&self, projectile: &Projectile) -> EntityState {
        EntityState::new(self.kind())
            .with("owner", projectile.owner.raw() as i64)
            .with("x", projectile.origin.x)
            .with("y", projectile.origin.y)
            .with("fired_at", projectile.fired_at as i64)
    }

    fn from_state(&self, state: &EntityState) -> Option<Projectile> {
        Some(Projectile {
            owner: ParticipantId::new(state.get("owner")?.as_int()? as u64),
            origin: Vec2::new(
                state.get_number("x")? as f32,
                state.get_number("y")? as f32,
            ),
            fired_at: state.get("fired_at")?.as_int()? as Millis,
        })
    }
}

/// Participants walk along their held keys; shots become short-lived projectiles
#[derive(Debug, Default)]
struct Arena {
    positions: BTreeMap<ParticipantId, Vec2>,
    headings: BTreeMap<ParticipantId, Vec2>,
    projectiles: Vec<Projectile>,
    steps: u32,
}

impl Simulation for Arena {
    fn step(&mut self, now: Millis, roster: &Roster) {
        self.steps += 1;
        for participant in roster.iter() {
            let heading = self
                .headings
                .get(&participant.id)
                .copied()
                .unwrap_or(Vec2::ZERO);
            let spawn = Vec2::new(participant.seat.0 as f32 * 40.0, 0.0);
            let position = self.positions.entry(participant.id).or_insert(spawn);
            position.x += heading.x * 2.0;
            position.y += heading.y * 2.0;
        }
        self.projectiles
            .retain(|projectile| now.saturating_sub(projectile.fired_at) < 300);
    }

    fn apply_input(&mut self, participant: ParticipantId, input: &InputFrame) {
        self.headings.insert(participant, input.keys.direction());
        if input.shoot {
            let origin = self.positions.get(&participant).copied().unwrap_or(Vec2::ZERO);
            self.projectiles.push(Projectile {
                owner: participant,
                origin,
                fired_at: self.steps as Millis * TICK_MS,
            });
        }
    }

    fn participant_position(&self, participant: ParticipantId) -> Option<Vec2> {
        self.positions.get(&participant).copied()
    }

    fn fill_snapshot(&self, snapshot: &mut Snapshot) {
        snapshot.projectiles = encode_entities(&ProjectileCodec, &self.projectiles);
    }
}

/// Logs every applied card instead of changing the arena
struct LoggedEffects;

impl EffectApplier for LoggedEffects {
    fn apply(
        &mut self,
        kind: OfferKind,
        target: Option<ParticipantId>,
        choice: &Choice,
    ) -> melee_draft::Result<()> {
        info!(?kind, ?target, card = %choice.name, "effect applied");
        Ok(())
    }
}

/// Bots pick uniformly at random
struct RandomDecider(GameRng);

impl BotDecider for RandomDecider {
    fn decide(&mut self, _target: ParticipantId, choices: &[Choice]) -> Option<String> {
        let index = self.0.pick_index(choices.len())?;
        choices.get(index).map(|choice| choice.name.clone())
    }
}

/// Prints a one-line summary of what joiner B would draw
#[derive(Default)]
struct SpectatorView {
    frames: u32,
}

impl Renderer for SpectatorView {
    fn render(&mut self, frame: &RenderFrame) {
        self.frames += 1;
        let positions: Vec<String> = frame
            .participants
            .iter()
            .map(|p| format!("{}@({:.0},{:.0})", p.name, p.position.x, p.position.y))
            .collect();
        let projectiles = decode_entities(&ProjectileCodec, &frame.projectiles);
        info!(
            paused = frame.paused,
            projectiles = projectiles.len(),
            "frame {}",
            positions.join(" ")
        );
    }
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug)]
struct PipeClosed;

impl fmt::Display for PipeClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipe closed")
    }
}

impl std::error::Error for PipeClosed {}

/// One direction of an in-memory reliable, ordered channel
#[derive(Debug, Default)]
struct Pipe {
    queue: RefCell<VecDeque<Vec<u8>>>,
    closed: RefCell<bool>,
}

impl Connection for Pipe {
    type Error = PipeClosed;

    fn send(&self, data: &[u8]) -> Result<(), PipeClosed> {
        if *self.closed.borrow() {
            return Err(PipeClosed);
        }
        self.queue.borrow_mut().push_back(data.to_vec());
        Ok(())
    }

    fn recv(&self) -> Result<Option<Vec<u8>>, PipeClosed> {
        Ok(self.queue.borrow_mut().pop_front())
    }

    fn is_connected(&self) -> bool {
        !*self.closed.borrow()
    }

    fn close(&self) -> Result<(), PipeClosed> {
        *self.closed.borrow_mut() = true;
        Ok(())
    }
}
