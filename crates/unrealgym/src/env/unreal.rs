//! The multi-agent environment loop over a [`SensorService`].

use super::service::{Command, SensorService};
use super::session::Session;
use super::traits::{EpisodeInfo, MultiAgentEnv, StepInfo, StepOutput};
use crate::agent::{AgentCategory, AgentConfig, AgentRegistry, Roster};
use crate::augment;
use crate::config::{EnvConfig, EnvSetting};
use crate::dispatch::{map_actions, AgentAction};
use crate::fusion::{compose_observation, project_for_display, CameraFlags, SensorBatch};
use crate::geometry::{Pose, RelativeGeometry};
use crate::sampling::{self, ResetArea, START_AREA_RANGE};
use crate::spaces::{ActionSpace, ObservationSpace};
use crate::{Result, UnrealError};
use ndarray::ArrayD;

/// Rotation of the top-view camera: straight down.
const TOP_VIEW_ROTATION: [f32; 3] = [-90.0, 0.0, 0.0];
/// Move vector that halts a drone.
const DRONE_STOP: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// A running scene exposed as a multi-agent environment.
///
/// The environment owns its service and all mutable state, so a roster
/// change can never interleave with a step.
pub struct UnrealEnv<S: SensorService> {
    service: S,
    setting: EnvSetting,
    config: EnvConfig,
    roster: Roster,
    session: Session,
    cam_flags: CameraFlags,
    reset_area: ResetArea,
    start_area: [f32; 4],
    launched: bool,
    poses: Vec<Pose>,
    display: Option<ArrayD<f32>>,
}

impl<S: SensorService> UnrealEnv<S> {
    pub fn new(service: S, setting: EnvSetting, config: EnvConfig) -> Result<Self> {
        let first_start = *setting
            .safe_start
            .first()
            .ok_or_else(|| UnrealError::Config("setting must list at least one safe start point".into()))?;
        let roster = Roster::from_setting(&setting, &config)?;
        let mut session = Session::new(config.seed);
        session.set_protagonist(config.protagonist);

        Ok(Self {
            service,
            reset_area: ResetArea::from(setting.reset_area),
            start_area: sampling::start_area(first_start, START_AREA_RANGE),
            cam_flags: CameraFlags::for_mode(config.observation_mode),
            setting,
            config,
            roster,
            session,
            launched: false,
            poses: Vec::new(),
            display: None,
        })
    }

    pub fn seed(&mut self, seed: u64) {
        self.session.reseed(seed);
    }

    pub fn registry(&self) -> &AgentRegistry {
        self.roster.registry()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn setting(&self) -> &EnvSetting {
        &self.setting
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    pub fn cam_flags(&self) -> CameraFlags {
        self.cam_flags
    }

    /// Request channels beyond what the observation mode needs.
    pub fn set_cam_flags(&mut self, flags: CameraFlags) {
        self.cam_flags = flags;
    }

    pub fn set_protagonist(&mut self, index: usize) {
        self.session.set_protagonist(index);
    }

    /// Poses read on the last reset or step, in roster order.
    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn reset_area(&self) -> &ResetArea {
        &self.reset_area
    }

    /// Obstacle-free square `[x_min, x_max, y_min, y_max]` around the first safe start.
    pub fn start_area(&self) -> [f32; 4] {
        self.start_area
    }

    pub fn is_launched(&self) -> bool {
        self.launched
    }

    pub fn add_agent(&mut self, name: &str, location: [f32; 3], template: &AgentConfig) -> Result<AgentConfig> {
        self.roster
            .add(&mut self.service, name, location, template, self.session.rng_mut())
    }

    pub fn remove_agent(&mut self, name: &str) -> Result<AgentConfig> {
        self.roster.remove(&mut self.service, name)
    }

    /// Grow or shrink to `target` agents, spawning newcomers at safe starts.
    pub fn set_population(&mut self, target: usize) -> Result<()> {
        let episode = self.session.episode();
        self.roster.set_population(
            &mut self.service,
            target,
            episode,
            &self.setting.safe_start,
            self.session.rng_mut(),
        )
    }

    pub fn randomize_appearance(&mut self) -> Result<()> {
        augment::randomize_appearance(&mut self.service, self.roster.registry(), self.session.rng_mut())
    }

    /// Camera position on a circle of `distance` around `target`, inside the reset area.
    pub fn find_start_point(&mut self, target: [f32; 3], distance: Option<f32>, height: f32) -> Option<[f32; 3]> {
        sampling::find_start_point(target, distance, &self.reset_area, height, None, self.session.rng_mut())
    }

    fn launch(&mut self) -> Result<()> {
        self.service.set_map(&self.setting.env_name)?;
        let dropped = self
            .roster
            .retain_categories(&mut self.service, &self.config.controlled_categories)?;
        if !dropped.is_empty() {
            tracing::info!(?dropped, "removed agents outside the controlled categories");
        }

        for record in self.roster.registry().records() {
            let name = record.name();
            self.service.set_entity_scale(name, record.config.scale)?;
            self.service.set_entity_random(name, false)?;
            self.service.set_entity_interval(name, self.roster.interval())?;
        }
        self.launched = true;
        tracing::info!(
            map = %self.setting.env_name,
            agents = self.roster.len(),
            mode = %self.config.observation_mode,
            "environment launched"
        );
        Ok(())
    }

    fn stop_drones(&mut self) -> Result<()> {
        let drones: Vec<String> = self
            .roster
            .registry()
            .records()
            .iter()
            .filter(|r| r.config.category == AgentCategory::Drone && !r.config.internal_nav)
            .map(|r| r.name().to_string())
            .collect();
        if drones.is_empty() {
            return Ok(());
        }

        let stops: Vec<Command> = drones
            .iter()
            .map(|name| Command::Move {
                agent: name.clone(),
                values: DRONE_STOP.to_vec(),
            })
            .collect();
        self.service.send_batched_commands(&stops)?;
        for name in &drones {
            self.service.set_entity_physics(name, true)?;
        }
        Ok(())
    }

    fn place_top_view(&mut self, location: [f32; 3]) -> Result<()> {
        let cam_id = self.setting.third_cam.cam_id;
        let above = [location[0], location[1], self.setting.third_cam.height_top_view];
        self.service.set_camera_location(cam_id, above)?;
        self.service.set_camera_rotation(cam_id, TOP_VIEW_ROTATION)
    }

    /// Read one sensor batch and compose the observation from it.
    fn observe(&mut self) -> Result<(ArrayD<f32>, SensorBatch)> {
        let registry = self.roster.registry();
        let names = registry.all();
        let cam_ids = registry.cam_list();
        let sensors = self.service.read_batch(&names, &cam_ids, self.cam_flags)?;
        if sensors.len() != names.len() {
            return Err(UnrealError::ShapeMismatch {
                expected: vec![names.len()],
                actual: vec![sensors.len()],
            });
        }

        let mode = self.config.observation_mode;
        let observation = compose_observation(mode, self.config.resolution, &sensors)?;
        self.display = project_for_display(mode, self.session.protagonist(), &observation);
        self.poses = sensors.object_poses.clone();
        Ok((observation, sensors))
    }

    /// Start a new episode: place every agent and return the first observation.
    pub fn reset(&mut self) -> Result<ArrayD<f32>> {
        if !self.launched {
            self.launch()?;
        }
        let episode = self.session.begin_episode();

        self.stop_drones()?;

        let n = self.roster.len();
        let use_reset_area = self.config.random_init || self.setting.random_init;
        let starts = sampling::sample_init_poses(
            &self.setting.safe_start,
            &self.reset_area,
            use_reset_area,
            n,
            self.session.rng_mut(),
        );
        for (record, location) in self.roster.registry().records().iter().zip(&starts) {
            let name = record.name();
            self.service.set_entity_location(name, *location)?;
            self.service
                .set_camera_mount(name, record.config.relative_location, record.config.relative_rotation)?;
        }

        if n > 0 {
            let protagonist = self.session.protagonist();
            let location = starts.get(protagonist).copied().ok_or_else(|| {
                UnrealError::Config(format!("protagonist {protagonist} is outside a roster of {n} agents"))
            })?;
            self.place_top_view(location)?;
        }

        let (observation, _) = self.observe()?;
        tracing::debug!(episode, agents = n, shape = ?observation.shape(), "reset");
        Ok(observation)
    }

    /// Apply one action per agent and observe the result.
    pub fn step(&mut self, actions: &[Option<AgentAction>]) -> Result<StepOutput> {
        if !self.session.started() {
            return Err(UnrealError::Config("step called before reset".into()));
        }

        let batch = map_actions(actions, self.roster.registry())?;
        let commands = batch.commands(self.roster.registry());
        self.service.send_batched_commands(&commands)?;
        let steps = self.session.tick();

        let (observation, sensors) = self.observe()?;
        let geometry = RelativeGeometry::compute(&sensors.object_poses);
        let metrics = geometry.metrics();
        tracing::debug!(
            episode = self.session.episode(),
            steps,
            commands = commands.len(),
            collisions = metrics.collision_count(),
            mean_distance = metrics.mean_distance,
            "step"
        );

        Ok(StepOutput {
            observation,
            rewards: vec![0.0; self.roster.len()],
            done: false,
            info: StepInfo {
                collision: metrics.collision,
                mean_distance: metrics.mean_distance,
                pose: sensors.object_poses,
                relative_pose: geometry.relative_pose,
                pose_obs: geometry.pose_obs,
                steps,
                action: actions.to_vec(),
                episode: EpisodeInfo::new(),
            },
        })
    }

    /// Displayable frame of the protagonist from the last observation.
    pub fn render(&self) -> Option<&ArrayD<f32>> {
        self.display.as_ref()
    }

    pub fn close(&mut self) -> Result<()> {
        if self.launched {
            self.launched = false;
            self.service.close()?;
            tracing::info!(episodes = self.session.episode(), "environment closed");
        }
        Ok(())
    }
}

impl<S: SensorService> MultiAgentEnv for UnrealEnv<S> {
    fn reset(&mut self) -> Result<ArrayD<f32>> {
        UnrealEnv::reset(self)
    }

    fn step(&mut self, actions: &[Option<AgentAction>]) -> Result<StepOutput> {
        UnrealEnv::step(self, actions)
    }

    fn num_agents(&self) -> usize {
        self.roster.len()
    }

    fn action_spaces(&self) -> Vec<&ActionSpace> {
        self.roster.registry().action_spaces()
    }

    fn observation_spaces(&self) -> Vec<&ObservationSpace> {
        self.roster.registry().observation_spaces()
    }

    fn render(&self) -> Option<&ArrayD<f32>> {
        UnrealEnv::render(self)
    }

    fn close(&mut self) -> Result<()> {
        UnrealEnv::close(self)
    }
}
