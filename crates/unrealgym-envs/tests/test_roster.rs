//! Roster changes on a live scene.

use ndarray::IxDyn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use unrealgym::prelude::*;
use unrealgym_envs::{demo_setting, npc_template, player_template, MockUnreal};

fn launched_env(players: usize, mode: ObservationMode) -> UnrealEnv<MockUnreal> {
    let setting = demo_setting(players);
    let service = MockUnreal::from_setting(&setting, (16, 16));
    let config = EnvConfig::default()
        .with_observation_mode(mode)
        .with_resolution(16, 16)
        .with_seed(11);
    let mut env = UnrealEnv::new(service, setting, config).unwrap();
    env.reset().unwrap();
    env
}

fn assert_aligned(env: &UnrealEnv<MockUnreal>) {
    let registry = env.registry();
    let n = registry.len();
    assert_eq!(registry.all().len(), n);
    assert_eq!(registry.cam_list().len(), n);
    assert_eq!(registry.action_spaces().len(), n);
    assert_eq!(registry.observation_spaces().len(), n);
    for (name, cam) in registry.all().into_iter().zip(registry.cam_list()) {
        let engine_cam = env.service().camera_of(name).unwrap_or(-1);
        assert_eq!(cam, engine_cam, "camera of {name}");
    }
}

#[test]
fn test_add_assigns_next_camera() {
    let mut env = launched_env(3, ObservationMode::Color);
    // World camera plus three players
    assert_eq!(env.service_mut().camera_count().unwrap(), 4);

    let template = player_template("template", 1);
    let added = env.add_agent("newcomer", [100.0, 100.0, 100.0], &template).unwrap();
    assert_eq!(added.cam_id, 4);
    assert_eq!(added.name, "newcomer");
    assert_eq!(env.registry().all().last(), Some(&"newcomer"));
    assert!(env.registry().observation_spaces()[3].is_image());
    assert_eq!(env.service().class_of("newcomer"), Some("bp_character_C"));
    assert_eq!(env.service().physics_of("newcomer"), Some(false));
    assert_eq!(env.service().interval_of("newcomer"), Some(1));
    assert_eq!(env.service().pose_of("newcomer").unwrap().location(), [100.0, 100.0, 100.0]);
    assert_aligned(&env);

    let obs = env.step(&[None, None, None, None]).unwrap().observation;
    assert_eq!(obs.shape(), &[4, 16, 16, 3]);
}

#[test]
fn test_add_without_camera() {
    let mut env = launched_env(2, ObservationMode::Depth);
    let added = env.add_agent("bystander", [0.0; 3], &npc_template("template")).unwrap();
    assert_eq!(added.cam_id, -1);
    assert!(!env.registry().observation_spaces()[2].is_image());
    assert_aligned(&env);
}

#[test]
fn test_add_then_remove_restores_roster() {
    let mut env = launched_env(2, ObservationMode::Rgbd);
    let names: Vec<String> = env.registry().all().iter().map(|s| s.to_string()).collect();
    let cams = env.registry().cam_list();
    let spaces: Vec<ActionSpace> = env.registry().action_spaces().into_iter().cloned().collect();

    env.add_agent("visitor", [0.0; 3], &player_template("t", 1)).unwrap();
    env.remove_agent("visitor").unwrap();

    assert_eq!(env.registry().all(), names);
    assert_eq!(env.registry().cam_list(), cams);
    let after: Vec<ActionSpace> = env.registry().action_spaces().into_iter().cloned().collect();
    assert_eq!(after, spaces);
    assert!(!env.service().contains("visitor"));
    assert_aligned(&env);
}

#[test]
fn test_remove_shifts_higher_cameras() {
    let mut env = launched_env(3, ObservationMode::Color);
    assert_eq!(env.registry().cam_list(), vec![1, 2, 3]);

    let removed = env.remove_agent("player_0").unwrap();
    assert_eq!(removed.cam_id, 1);
    assert_eq!(env.registry().all(), vec!["player_1", "player_2"]);
    assert_eq!(env.registry().cam_list(), vec![1, 2]);
    assert_aligned(&env);

    // Frames still come from the right cameras
    let obs = env.step(&[None, None]).unwrap().observation;
    assert_eq!(obs[IxDyn(&[1, 0, 0, 0])], 2.0);
}

#[test]
fn test_remove_cameraless_agent_keeps_cameras() {
    let mut env = launched_env(2, ObservationMode::Color);
    env.add_agent("bystander", [0.0; 3], &npc_template("t")).unwrap();
    env.remove_agent("bystander").unwrap();
    assert_eq!(env.registry().cam_list(), vec![1, 2]);
    assert_aligned(&env);
}

#[test]
fn test_population_grows_and_shrinks_from_tail() {
    let mut env = launched_env(2, ObservationMode::Pose);
    env.set_population(4).unwrap();
    assert_eq!(
        env.registry().all(),
        vec!["player_0", "player_1", "player_EP1_2", "player_EP1_3"]
    );
    assert_aligned(&env);

    env.set_population(1).unwrap();
    assert_eq!(env.registry().all(), vec!["player_0"]);
    assert!(!env.service().contains("player_EP1_3"));
    assert!(!env.service().contains("player_1"));
    assert_aligned(&env);

    let out = env.step(&[Some(AgentAction::Discrete(0))]).unwrap();
    assert_eq!(out.info.collision.shape(), &[1, 1]);
}

#[test]
fn test_roster_errors() {
    let mut env = launched_env(2, ObservationMode::Color);
    assert!(matches!(env.remove_agent("ghost"), Err(UnrealError::NotFound(_))));
    assert!(matches!(
        env.add_agent("player_0", [0.0; 3], &player_template("t", 1)),
        Err(UnrealError::Config(_))
    ));

    env.service_mut().fail_next("spawn_entity");
    assert!(matches!(
        env.add_agent("late", [0.0; 3], &player_template("t", 1)),
        Err(UnrealError::Service(_))
    ));
    assert_eq!(env.registry().len(), 2);
    assert!(!env.service().contains("late"));
    assert_aligned(&env);
}

#[test]
fn test_failed_setup_destroys_spawned_entity() {
    let mut env = launched_env(2, ObservationMode::Color);
    let template = player_template("t", 1);

    env.service_mut().fail_next("set_entity_scale");
    assert!(matches!(
        env.add_agent("late", [0.0; 3], &template),
        Err(UnrealError::Service(_))
    ));
    assert_eq!(env.registry().all(), vec!["player_0", "player_1"]);
    assert!(!env.service().contains("late"));
    assert_eq!(env.service_mut().camera_count().unwrap(), 3);

    // The name is free again and the retry gets the next camera
    let added = env.add_agent("late", [0.0; 3], &template).unwrap();
    assert_eq!(added.cam_id, 3);
    assert_aligned(&env);
}

#[test]
fn test_population_regrows_after_removal() {
    let mut env = launched_env(2, ObservationMode::Pose);
    env.set_population(4).unwrap();
    env.remove_agent("player_0").unwrap();

    env.set_population(4).unwrap();
    assert_eq!(
        env.registry().all(),
        vec!["player_1", "player_EP1_2", "player_EP1_3", "player_EP1_4"]
    );
    assert_aligned(&env);
}

#[test]
fn test_empty_roster_observation_keeps_rank() {
    let mut env = launched_env(2, ObservationMode::Color);
    env.set_population(0).unwrap();
    assert!(env.registry().is_empty());

    let obs = env.reset().unwrap();
    assert_eq!(obs.shape(), &[0, 16, 16, 3]);
    assert!(env.render().is_none());
}

#[test]
fn test_retain_categories_on_roster() {
    let setting = demo_setting(2);
    let config = EnvConfig::default().with_observation_mode(ObservationMode::Pose);
    let mut service = MockUnreal::from_setting(&setting, (16, 16));
    let mut roster = Roster::from_setting(&setting, &config).unwrap();

    let dropped = roster
        .retain_categories(&mut service, &[AgentCategory::Player, AgentCategory::Npc])
        .unwrap();
    assert_eq!(dropped, vec!["drone_0".to_string()]);
    assert_eq!(roster.registry().all(), vec!["player_0", "player_1", "npc_0"]);
    assert!(!service.contains("drone_0"));
}

#[test]
fn test_roster_add_directly() {
    let setting = demo_setting(1);
    let config = EnvConfig::default().with_observation_mode(ObservationMode::Mask);
    let mut service = MockUnreal::from_setting(&setting, (16, 16));
    let mut roster = Roster::from_setting(&setting, &config).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    // world, player_0, drone_0
    let added = roster
        .add(&mut service, "p2", [1.0, 2.0, 3.0], &player_template("t", 1), &mut rng)
        .unwrap();
    assert_eq!(added.cam_id, 3);
    assert_eq!(service.scale_of("p2"), Some([1.0, 1.0, 1.0]));
    assert_eq!(service.is_random("p2"), Some(false));
}

#[test]
fn test_randomized_appearance_in_range() {
    let mut env = launched_env(3, ObservationMode::Color);
    env.randomize_appearance().unwrap();
    for name in ["player_0", "player_1", "player_2"] {
        let appearance = env.service().appearance_of(name).unwrap();
        assert!((1..19).contains(&appearance), "{name} got {appearance}");
    }
}
