use flamepp::core::config::{ConfigValue, ElementConfig, LatticeConfig, ParamMap};
use flamepp::core::math::PS_1;
use flamepp::engine::Machine;
use proptest::prelude::*;

fn beam(elements: Vec<ElementConfig>) -> LatticeConfig {
    let mut initial = vec![0.0; 49];
    for (i, s) in [1.5, 1e-3, 2.0, 1.5e-3, 2e-2, 5e-4].iter().enumerate() {
        initial[i * 7 + i] = s * s;
    }
    initial[1] = 0.5 * 1.5 * 1e-3;
    initial[7] = initial[1];

    let mut config = LatticeConfig::builder()
        .global("IonEs", 931.494_32e6)
        .global("IonEk", 1.0e6)
        .global("IonZ", 0.25)
        .global("initial", ConfigValue::from(initial))
        .build();
    config.elements = elements;
    config
}

fn arb_element() -> impl Strategy<Value = ElementConfig> {
    prop_oneof![
        (0.0..2.0f64).prop_map(|l| ElementConfig::new("D", "drift").with("L", l)),
        (0.05..0.4f64, -10.0..10.0f64).prop_map(|(l, b2)| {
            ElementConfig::new("Q", "quadrupole").with("L", l).with("B2", b2)
        }),
        (
            0.2..2.0f64,
            prop_oneof![-30.0..-1.0f64, 1.0..30.0f64],
            -1.0..1.0f64
        )
            .prop_map(|(l, phi, k)| {
                ElementConfig::new("B", "sbend").with("L", l).with("phi", phi).with("K", k)
            }),
        (0.05..0.5f64, -4.0..4.0f64).prop_map(|(l, b)| {
            ElementConfig::new("S", "solenoid").with("L", l).with("B", b)
        }),
    ]
}

proptest! {
    #[test]
    fn covariance_stays_symmetric_and_positive(
        elements in prop::collection::vec(arb_element(), 1..12),
    ) {
        let machine = Machine::new(beam(elements)).unwrap();
        let mut state = machine.alloc_state(&ParamMap::new()).unwrap();
        machine.propagate(&mut state, 0, machine.len(), None).unwrap();

        let sigma = state.charge_states()[0].moment1;
        prop_assert_eq!(sigma, sigma.transpose());
        for k in 0..=PS_1 {
            prop_assert_eq!(sigma[(PS_1, k)], 0.0);
        }

        let physical = sigma.fixed_view::<6, 6>(0, 0).into_owned();
        let eigenvalues = physical.symmetric_eigenvalues();
        let largest = eigenvalues.iter().fold(0.0f64, |m, e| m.max(e.abs()));
        for e in eigenvalues.iter() {
            prop_assert!(*e >= -1e-9 * largest, "eigenvalue {} of {}", e, largest);
        }
    }

    #[test]
    fn split_propagation_composes(
        elements in prop::collection::vec(arb_element(), 2..10),
        split in any::<prop::sample::Index>(),
    ) {
        let machine = Machine::new(beam(elements)).unwrap();
        let initial = machine.alloc_state(&ParamMap::new()).unwrap();
        let at = split.index(machine.len() + 1);

        let mut whole = initial.clone();
        machine.propagate(&mut whole, 0, machine.len(), None).unwrap();

        let mut parts = initial;
        let first = machine.propagate(&mut parts, 0, at, None).unwrap();
        let second = machine.propagate(&mut parts, at, machine.len(), None).unwrap();

        prop_assert_eq!(first + second, machine.len());
        prop_assert_eq!(parts, whole);
    }
}
