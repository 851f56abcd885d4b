use std::path::PathBuf;

#[test]
fn demos_validate() {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let root = crate_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root");

    let demos = [
        "demos/projects/01_linear_storage.yaml",
        "demos/projects/02_two_storage_chain.yaml",
        "demos/projects/03_splitter.yaml",
    ];

    for rel in demos {
        let path = root.join(rel);
        let result = hf_project::load_yaml(&path);
        assert!(
            result.is_ok(),
            "demo failed validation: {} => {:?}",
            path.display(),
            result.err()
        );
    }
}

#[test]
fn demo_defaults_are_filled() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join("demos/projects/03_splitter.yaml");
    let project = hf_project::load_yaml(&root).unwrap();

    assert_eq!(project.solver.iterations, 1);
    assert_eq!(project.timer.time_step, 1);
    assert_eq!(project.timer.time_step_unit, "Day");
    assert_eq!(project.hydro_units[0].area, 1.0);
    let outputs = &project.structures[0].splitters[0].outputs;
    assert!(outputs.iter().all(|o| o.kind == "Direct"));
}
