#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nalgebra::{Matrix3, Point2, Vector3};
use solid_dynamics::{
    ContinuumElement, Domain, ElementShape, ElementSpec, FemError, FemResult, LinearElastic,
    Material, MaterialModel, MaterialProperties, PlaneCondition, ProblemSetup,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Unit-square Quad4 with only the x-displacement of node 2 free
pub fn sdof_setup(props: MaterialProperties) -> ProblemSetup {
    ProblemSetup {
        nodes: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        elements: vec![ElementSpec { shape: ElementShape::Quad4, nodes: vec![0, 1, 2, 3], material: 0 }],
        materials: vec![props],
        ebc: vec![vec![-1, -1], vec![-1, -1], vec![0, -1], vec![-1, -1]],
        g: vec![],
        nbc: vec![vec![0, 0]; 4],
        f: vec![],
    }
}

pub fn elastic_props() -> MaterialProperties {
    MaterialProperties::elastic("PlaneStrain", 1.0, 100.0, 0.2)
}

/// Two Quad4 elements in a row with the left edge clamped and no loads
pub fn clamped_strip(props: MaterialProperties) -> ProblemSetup {
    ProblemSetup {
        nodes: vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]],
        elements: vec![
            ElementSpec { shape: ElementShape::Quad4, nodes: vec![0, 1, 4, 3], material: 0 },
            ElementSpec { shape: ElementShape::Quad4, nodes: vec![1, 2, 5, 4], material: 0 },
        ],
        materials: vec![props],
        ebc: vec![vec![-1, -1], vec![0, 0], vec![0, 0], vec![-1, -1], vec![0, 0], vec![0, 0]],
        g: vec![],
        nbc: vec![vec![0, 0]; 6],
        f: vec![],
    }
}

/// Elastic material that fails while a shared counter is positive
#[derive(Debug)]
pub struct FlakyMaterial {
    inner: LinearElastic,
    failures_left: Arc<AtomicUsize>,
}

impl Material for FlakyMaterial {
    fn get_stress(
        &mut self,
        strain: &Vector3<f64>,
        dstrain: &Vector3<f64>,
        dt: f64,
    ) -> FemResult<(Vector3<f64>, Matrix3<f64>)> {
        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(FemError::ConstitutiveFailure("injected failure".to_string()));
        }
        self.inner.get_stress(strain, dstrain, dt)
    }

    fn tangent(&self) -> Matrix3<f64> {
        self.inner.tangent()
    }

    fn commit_history(&mut self) {
        self.inner.commit_history();
    }

    fn density(&self) -> f64 {
        self.inner.density()
    }

    fn committed_stress(&self) -> Vector3<f64> {
        self.inner.committed_stress()
    }

    fn committed_strain(&self) -> Vector3<f64> {
        self.inner.committed_strain()
    }
}

/// Elastic material that fails on every call from the `fail_from`-th on
///
/// `calls` is shared, so it counts evaluations across all quadrature points.
#[derive(Debug)]
pub struct CountingMaterial {
    inner: LinearElastic,
    calls: Arc<AtomicUsize>,
    fail_from: Arc<AtomicUsize>,
}

impl Material for CountingMaterial {
    fn get_stress(
        &mut self,
        strain: &Vector3<f64>,
        dstrain: &Vector3<f64>,
        dt: f64,
    ) -> FemResult<(Vector3<f64>, Matrix3<f64>)> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.fail_from.load(Ordering::SeqCst) {
            return Err(FemError::ConstitutiveFailure(format!("injected failure at call {}", call)));
        }
        self.inner.get_stress(strain, dstrain, dt)
    }

    fn tangent(&self) -> Matrix3<f64> {
        self.inner.tangent()
    }

    fn commit_history(&mut self) {
        self.inner.commit_history();
    }

    fn density(&self) -> f64 {
        self.inner.density()
    }

    fn committed_stress(&self) -> Vector3<f64> {
        self.inner.committed_stress()
    }

    fn committed_strain(&self) -> Vector3<f64> {
        self.inner.committed_strain()
    }
}

/// Elastic stress with a tangent that underestimates the true one
#[derive(Debug)]
pub struct SoftTangentMaterial {
    inner: LinearElastic,
    softening: f64,
}

impl Material for SoftTangentMaterial {
    fn get_stress(
        &mut self,
        strain: &Vector3<f64>,
        dstrain: &Vector3<f64>,
        dt: f64,
    ) -> FemResult<(Vector3<f64>, Matrix3<f64>)> {
        let (stress, tangent) = self.inner.get_stress(strain, dstrain, dt)?;
        Ok((stress, tangent / self.softening))
    }

    fn tangent(&self) -> Matrix3<f64> {
        self.inner.tangent() / self.softening
    }

    fn commit_history(&mut self) {
        self.inner.commit_history();
    }

    fn density(&self) -> f64 {
        self.inner.density()
    }

    fn committed_stress(&self) -> Vector3<f64> {
        self.inner.committed_stress()
    }

    fn committed_strain(&self) -> Vector3<f64> {
        self.inner.committed_strain()
    }
}

fn sdof_elastic() -> LinearElastic {
    LinearElastic::new(100.0, 0.2, 1.0, PlaneCondition::PlaneStrain)
}

/// Unit-square Quad4 with only node 2 x free, built from user materials
pub fn external_sdof_domain(mut make: impl FnMut() -> Box<dyn Material>) -> Domain {
    let materials = (0..4).map(|_| MaterialModel::external(make())).collect();
    let nodes = vec![
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(0.0, 1.0),
    ];
    let element = ContinuumElement::new(ElementShape::Quad4, vec![0, 1, 2, 3], nodes.clone(), materials).unwrap();

    Domain::new(
        nodes,
        vec![element],
        &[vec![-1, -1], vec![-1, -1], vec![0, -1], vec![-1, -1]],
        &[],
        &vec![vec![0, 0]; 4],
        &[],
    )
    .unwrap()
}

/// Single-DOF domain whose materials share one failure counter
pub fn flaky_sdof_domain(failures_left: Arc<AtomicUsize>) -> Domain {
    external_sdof_domain(|| {
        Box::new(FlakyMaterial { inner: sdof_elastic(), failures_left: Arc::clone(&failures_left) })
    })
}

/// Single-DOF domain whose materials fail from the `fail_from`-th evaluation
pub fn counting_sdof_domain(calls: Arc<AtomicUsize>, fail_from: Arc<AtomicUsize>) -> Domain {
    external_sdof_domain(|| {
        Box::new(CountingMaterial {
            inner: sdof_elastic(),
            calls: Arc::clone(&calls),
            fail_from: Arc::clone(&fail_from),
        })
    })
}

/// Single-DOF domain whose Newton tangent is the elastic one divided by `softening`
pub fn soft_tangent_sdof_domain(softening: f64) -> Domain {
    external_sdof_domain(|| Box::new(SoftTangentMaterial { inner: sdof_elastic(), softening }))
}

/// Single-DOF elastic domain built through the same path as the user-material ones
pub fn elastic_sdof_domain() -> Domain {
    external_sdof_domain(|| Box::new(sdof_elastic()))
}
