//! Assembled mass: symmetric, positive semi-definite, lumped = row sums

mod common;

use approx::assert_relative_eq;
use common::{clamped_strip, elastic_props};
use solid_dynamics::{Domain, ElementShape, ElementSpec, GlobalData, MaterialProperties, ProblemSetup};

fn mixed_mesh() -> ProblemSetup {
    // Quad on the left, two triangles on the right; bottom-left corner pinned
    ProblemSetup {
        nodes: vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]],
        elements: vec![
            ElementSpec { shape: ElementShape::Quad4, nodes: vec![0, 1, 4, 3], material: 0 },
            ElementSpec { shape: ElementShape::Tri3, nodes: vec![1, 2, 5], material: 1 },
            ElementSpec { shape: ElementShape::Tri3, nodes: vec![1, 5, 4], material: 1 },
        ],
        materials: vec![
            MaterialProperties::elastic("PlaneStress", 2.0, 100.0, 0.3),
            MaterialProperties::elastic("PlaneStrain", 0.5, 100.0, 0.3),
        ],
        ebc: vec![vec![-1, -1], vec![0, 0], vec![0, 0], vec![0, 0], vec![0, 0], vec![0, 0]],
        g: vec![],
        nbc: vec![vec![0, 0]; 6],
        f: vec![],
    }
}

#[test]
fn mass_is_symmetric_positive_semidefinite() {
    for setup in [mixed_mesh(), clamped_strip(elastic_props())] {
        let mut domain = Domain::from_setup(&setup).unwrap();
        let mut globdat = GlobalData::new(domain.neqs());
        domain.assemble_mass_matrix(&mut globdat).unwrap();

        let m = globdat.mass().unwrap().to_dense();
        assert_relative_eq!((&m - m.transpose()).norm(), 0.0, epsilon = 1e-14);

        let eigen = m.clone().symmetric_eigen();
        for &lambda in eigen.eigenvalues.iter() {
            assert!(lambda > -1e-12, "negative mass eigenvalue {}", lambda);
        }
    }
}

#[test]
fn lumped_mass_matches_row_sums() {
    let mut domain = Domain::from_setup(&mixed_mesh()).unwrap();
    let mut globdat = GlobalData::new(domain.neqs());
    domain.assemble_mass_matrix(&mut globdat).unwrap();

    let m = globdat.mass().unwrap().to_dense();
    let lumped = globdat.mass_lumped().unwrap();
    assert_eq!(lumped.len(), domain.neqs());
    for (i, &ml) in lumped.iter().enumerate() {
        assert_relative_eq!(ml, m.row(i).sum(), epsilon = 1e-14);
        assert!(ml > 0.0);
    }
}

#[test]
fn total_mass_is_recovered_without_constraints() {
    let mut setup = mixed_mesh();
    setup.ebc = vec![vec![0, 0]; 6];
    let mut domain = Domain::from_setup(&setup).unwrap();
    let mut globdat = GlobalData::new(domain.neqs());
    domain.assemble_mass_matrix(&mut globdat).unwrap();

    // Per direction: ρ_quad · 1 + ρ_tri · 1
    let total: f64 = globdat.mass_lumped().unwrap().iter().step_by(2).sum();
    assert_relative_eq!(total, 2.0 * 1.0 + 0.5 * 1.0, epsilon = 1e-12);
}
