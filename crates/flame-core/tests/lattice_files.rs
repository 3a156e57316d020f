use flamepp::core::config::{ConfigError, ConfigValue, LatticeConfig, ParamMap};
use flamepp::core::elements::ElementKind;
use flamepp::engine::{EngineError, Machine};
use std::fs;
use tempfile::tempdir;

const LATTICE_TOML: &str = r#"
IonEs = 931494320.0
IonEk = 500000.0
IonZ = 0.1386554621848739

[[elements]]
name = "D1"
type = "drift"
L = 0.1

[[elements]]
name = "CAV1"
type = "rfcavity"
f = 80.5e6
phi = -25.0
field_file = "qwr.csv"
cavtype = "0.041QWR"

[[elements]]
name = "Q1"
type = "quadrupole"
L = 0.2
B2 = 3.5
dx = 0.0005

[[elements]]
name = "END"
type = "marker"
"#;

fn field_map_csv() -> String {
    let mut csv = String::from("# z [m], Ez [V/m]\n");
    let n = 81;
    for i in 0..n {
        let z = 0.2 * i as f64 / (n - 1) as f64;
        let u = (z - 0.1) / 0.03;
        csv.push_str(&format!("{z:.6}, {:.6e}\n", 3.0e6 * u * (-u * u).exp()));
    }
    csv
}

#[test]
fn toml_lattice_with_field_map_propagates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("qwr.csv"), field_map_csv()).unwrap();
    let lattice_path = dir.path().join("linac.toml");
    fs::write(&lattice_path, LATTICE_TOML).unwrap();

    let mut config = LatticeConfig::load(&lattice_path).unwrap();
    config.globals.insert(
        "Eng_Data_Dir".into(),
        ConfigValue::Text(dir.path().to_string_lossy().to_string()),
    );
    let machine = Machine::new(config).unwrap();
    assert_eq!(machine.len(), 4);
    assert_eq!(machine.element(1).unwrap().kind(), ElementKind::RfCavity);
    assert!((machine.element(1).unwrap().length() - 0.2).abs() < 1e-9);

    let mut state = machine.alloc_state(&ParamMap::new()).unwrap();
    let ek_in = state.reference().ion_ek;
    assert_eq!(machine.propagate(&mut state, 0, usize::MAX, None).unwrap(), 4);
    assert!(state.reference().ion_ek > ek_in);
    assert!((state.pos() - 0.5).abs() < 1e-9);
    assert!(state.charge_states()[0].moment0[0] != 0.0);
}

#[test]
fn json_lattice_round_trips_through_machine() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("line.json");
    fs::write(
        &path,
        r#"{
            "IonEs": 931494320.0,
            "IonEk": 500000.0,
            "IonZ": 0.25,
            "elements": [
                { "name": "D1", "type": "drift", "L": 1.5 },
                { "name": "G1", "type": "generic", "L": 0.0, "transfer": [
                    1, 0, 0, 0, 0, 0,
                    0, 1, 0, 0, 0, 0,
                    0, 0, 1, 0, 0, 0,
                    0, 0, 0, 1, 0, 0,
                    0, 0, 0, 0, 1, 0,
                    0, 0, 0, 0, 0, 1
                ] }
            ]
        }"#,
    )
    .unwrap();

    let machine = Machine::new(LatticeConfig::load(&path).unwrap()).unwrap();
    assert_eq!(machine.find("G1"), vec![1]);
    assert_eq!(machine.conf().elements[0].type_name, "drift");
    assert!((machine.total_length() - 1.5).abs() < 1e-12);
}

#[test]
fn missing_field_file_fails_construction() {
    let dir = tempdir().unwrap();
    let lattice_path = dir.path().join("linac.toml");
    fs::write(&lattice_path, LATTICE_TOML).unwrap();
    let config = LatticeConfig::load(&lattice_path).unwrap();
    assert!(matches!(
        Machine::new(config),
        Err(EngineError::Configuration(ConfigError::Csv { .. }))
    ));
}

#[test]
fn malformed_document_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[[elements]\nname = ").unwrap();
    match LatticeConfig::load(&path) {
        Err(ConfigError::Toml { path: reported, .. }) => assert!(reported.ends_with("broken.toml")),
        other => panic!("expected a TOML error, got {other:?}"),
    }
}
