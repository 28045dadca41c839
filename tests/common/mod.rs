use calo_truth_linker::{Cluster, LinkOutput, Linker, LinkerParams, McParticle, SearchAlgorithm};
use std::f32::consts::PI;

pub fn test_single_match<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let particles = vec![McParticle::new(1, 10.0, [0.0, 0.0, 1.0])];
    let clusters = vec![
        Cluster::new(9.0, [0.0, 0.0, 1.0]),
        Cluster::new(20.0, [1.0, 0.0, 0.0]),
    ];
    let params = LinkerParams::builder().cutoff_angle(0.2).build();
    let linker = Linker::new(&particles, &clusters, params);
    let output = link_fn(&linker);

    assert_eq!(1, output.len());
    assert_eq!(0, output.links()[0].from);
    assert_eq!(0, output.links()[0].to);
    assert_eq!((9.0_f32 - 10.0) / 10.0, output.residuals()[0]);
}

pub fn test_best_angle_just_above_cutoff<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let particles = vec![McParticle::new(1, 10.0, [0.0, 0.0, 1.0])];
    let angle = 0.05_f32;
    let clusters = vec![
        Cluster::new(9.0, [angle.sin(), 0.0, angle.cos()]),
        Cluster::new(20.0, [-angle.sin(), 0.0, angle.cos()]),
    ];
    let params = LinkerParams::builder().cutoff_angle(0.0001).build();
    let linker = Linker::new(&particles, &clusters, params);
    let output = link_fn(&linker);

    assert!(output.is_empty());
    assert!(output.residuals().is_empty());
}

pub fn test_best_angle_equal_to_cutoff<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    // Exactly aligned, so the best angle is exactly zero
    let particles = vec![McParticle::new(1, 10.0, [0.0, 0.0, 2.0])];
    let clusters = vec![Cluster::new(9.0, [0.0, 0.0, 100.0])];
    let params = LinkerParams::builder().cutoff_angle(0.0).build();
    let linker = Linker::new(&particles, &clusters, params);

    assert!(link_fn(&linker).is_empty());
}

pub fn test_best_angle_equal_to_nonzero_cutoff<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let momentum = [0.0_f32, 0.0, 1.0];
    let position = [0.3_f32, 0.0, 1.0];
    let particles = vec![McParticle::new(1, 10.0, momentum)];
    let clusters = vec![Cluster::new(9.0, position)];

    // Same operations, in the same order, as the linker's angle
    let dot = |a: &[f32; 3], b: &[f32; 3]| 0.0 + a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
    let cos_theta = dot(&position, &momentum)
        / (dot(&position, &position).sqrt() * dot(&momentum, &momentum).sqrt());
    let angle = cos_theta.max(-1.0).min(1.0).acos();
    assert!(angle > 0.25 && angle < 0.35);

    // f32 to f64 is exact, so the cutoff converts back to the same f32
    let params = LinkerParams::builder().cutoff_angle(angle as f64).build();
    let linker = Linker::new(&particles, &clusters, params);
    assert!(link_fn(&linker).is_empty());

    let just_above = f32::from_bits(angle.to_bits() + 1);
    let params = LinkerParams::builder().cutoff_angle(just_above as f64).build();
    let linker = Linker::new(&particles, &clusters, params);
    let output = link_fn(&linker);
    assert_eq!(1, output.len());
    assert_eq!(0, output.links()[0].from);
}

pub fn test_zero_momentum<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let particles = vec![McParticle::new(1, 10.0, [0.0, 0.0, 0.0])];
    let clusters = vec![Cluster::new(9.0, [0.0, 0.0, 1.0])];
    let params = LinkerParams::builder().cutoff_angle(f64::INFINITY).build();
    let linker = Linker::new(&particles, &clusters, params);

    assert!(link_fn(&linker).is_empty());
}

pub fn test_degenerate_clusters<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let particles = vec![McParticle::new(1, 10.0, [0.0, 0.0, 1.0])];
    let clusters = vec![
        Cluster::new(9.0, [0.0, 0.0, 0.0]),
        Cluster::new(11.0, [0.0, 0.0, 0.0]),
    ];
    let linker = Linker::new(&particles, &clusters, LinkerParams::default());
    assert!(link_fn(&linker).is_empty());

    // A usable cluster is still found behind a degenerate one
    let clusters = vec![
        Cluster::new(9.0, [0.0, 0.0, 0.0]),
        Cluster::new(11.0, [0.0, 0.01, 1.0]),
    ];
    let linker = Linker::new(&particles, &clusters, LinkerParams::default());
    let output = link_fn(&linker);
    assert_eq!(1, output.len());
    assert_eq!(1, output.links()[0].from);
}

pub fn test_secondary_particles_skipped<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let particles = vec![
        McParticle::new(0, 10.0, [0.0, 0.0, 1.0]),
        McParticle::new(1, 5.0, [1.0, 0.0, 0.0]),
        McParticle::new(0, 8.0, [1.0, 0.0, 0.0]),
    ];
    let clusters = vec![
        Cluster::new(10.0, [0.0, 0.0, 1.0]),
        Cluster::new(4.0, [1.0, 0.0, 0.0]),
    ];
    let linker = Linker::default_params(&particles, &clusters);
    let output = link_fn(&linker);

    assert_eq!(1, output.len());
    assert_eq!(1, output.links()[0].to);
    assert_eq!(1, output.links()[0].from);
    assert_eq!((4.0_f32 - 5.0) / 5.0, output.residuals()[0]);
}

pub fn test_empty_clusters<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let particles = vec![
        McParticle::new(1, 10.0, [0.0, 0.0, 1.0]),
        McParticle::new(2, 10.0, [0.0, 1.0, 0.0]),
    ];
    let clusters: Vec<Cluster<f32>> = Vec::new();
    // Even a cutoff no angle can reach must not conjure a match out of no clusters
    let params = LinkerParams::builder().cutoff_angle(f64::INFINITY).build();
    let linker = Linker::new(&particles, &clusters, params);
    let output = link_fn(&linker);

    assert!(output.is_empty());
    assert!(output.residuals().is_empty());
}

pub fn test_empty_particles<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let particles: Vec<McParticle<f32>> = Vec::new();
    let clusters = vec![Cluster::new(9.0, [0.0, 0.0, 1.0])];
    let linker = Linker::default_params(&particles, &clusters);

    assert!(link_fn(&linker).is_empty());
}

pub fn test_tie_keeps_first_cluster<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let particles = vec![McParticle::new(1, 10.0, [0.0, 0.1, 1.0])];
    let clusters = vec![
        Cluster::new(30.0, [0.0, -1.0, 0.0]),
        Cluster::new(12.0, [0.0, 0.1, 1.0]),
        Cluster::new(8.0, [0.0, 0.1, 1.0]),
    ];
    let linker = Linker::default_params(&particles, &clusters);
    let output = link_fn(&linker);

    assert_eq!(1, output.len());
    assert_eq!(1, output.links()[0].from);
    assert_eq!((12.0_f32 - 10.0) / 10.0, output.residuals()[0]);
}

pub fn test_closest_cluster_selected<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let particles = vec![McParticle::new(1, 10.0, [0.0, 0.0, 1.0])];
    let clusters = vec![
        Cluster::new(1.0, [0.15, 0.0, 1.0]),
        Cluster::new(2.0, [0.0, -0.05, 1.0]),
        Cluster::new(3.0, [0.1, 0.1, 1.0]),
        Cluster::new(4.0, [0.0, 0.0, -1.0]),
    ];
    let linker = Linker::default_params(&particles, &clusters);
    let output = link_fn(&linker);

    assert_eq!(1, output.len());
    assert_eq!(1, output.links()[0].from);
    assert_eq!((2.0_f32 - 10.0) / 10.0, output.residuals()[0]);
}

pub fn test_particles_share_a_cluster<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    // Matching is per particle, a cluster can be linked more than once
    let particles = vec![
        McParticle::new(1, 10.0, [0.0, 0.0, 1.0]),
        McParticle::new(1, 20.0, [0.0, 0.05, 1.0]),
    ];
    let clusters = vec![
        Cluster::new(15.0, [0.0, 0.02, 1.0]),
        Cluster::new(15.0, [0.0, 1.0, 0.0]),
    ];
    let linker = Linker::default_params(&particles, &clusters);
    let output = link_fn(&linker);

    assert_eq!(2, output.len());
    assert_eq!(0, output.links()[0].from);
    assert_eq!(0, output.links()[1].from);
    assert_eq!(vec![0.5, -0.25], output.residuals().to_vec());
}

pub fn test_output_alignment<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let clusters = sphere_clusters(150);
    let particles = sphere_particles(60);
    let params = LinkerParams::builder().cutoff_angle(0.15).build();
    let linker = Linker::new(&particles, &clusters, params);
    let output = link_fn(&linker);

    assert_eq!(output.links().len(), output.residuals().len());
    assert!(!output.is_empty());

    let resolved = output.resolve(&particles, &clusters).unwrap();
    let mut previous_particle = None;
    for (link, (cluster, particle, residual)) in output.links().iter().zip(resolved) {
        assert!(particle.generator_status != 0);
        assert_eq!((cluster.energy - particle.energy) / particle.energy, residual);
        // Output follows particle order, one entry at most per particle
        assert!(previous_particle.map_or(true, |previous| previous < link.to));
        previous_particle = Some(link.to);
    }
}

pub fn test_search_algorithms_agree<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let mut clusters = sphere_clusters(400);
    clusters.push(Cluster::new(7.0, [0.0, 0.0, 0.0]));
    clusters.push(Cluster::new(7.0, [f32::MAX, f32::MAX, 1.0]));
    let particles = sphere_particles(120);

    let outputs: Vec<LinkOutput<f32>> = [
        SearchAlgorithm::BruteForce,
        SearchAlgorithm::KdTree,
        SearchAlgorithm::Auto,
    ]
    .into_iter()
    .map(|algo| {
        let params = LinkerParams::builder()
            .cutoff_angle(0.1)
            .search_algorithm(algo)
            .build();
        link_fn(&Linker::new(&particles, &clusters, params))
    })
    .collect();

    assert!(!outputs[0].is_empty());
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[0], outputs[2]);
}

pub fn test_validation_toggle<F>(link_fn: F)
where
    F: Fn(&Linker<'_, f32>) -> LinkOutput<f32>,
{
    let particles = vec![McParticle::new(1, 10.0, [0.0, 0.0, 1.0])];
    let clusters = vec![Cluster::new(9.0, [0.0, 0.0, 1.0])];

    let linker = Linker::default_params(&particles, &clusters);
    let with_validation = link_fn(&linker);
    assert_eq!(Some(with_validation.residuals()), with_validation.validation_residuals());

    let params = LinkerParams::builder().produce_validation(false).build();
    let linker = Linker::new(&particles, &clusters, params);
    let without_validation = link_fn(&linker);
    assert_eq!(None, without_validation.validation_residuals());
    // Matching itself is unaffected
    assert_eq!(with_validation.links(), without_validation.links());
    assert_eq!(with_validation.residuals(), without_validation.residuals());
}

/// Clusters spread evenly over a sphere, at varying distances from the origin.
fn sphere_clusters(n: usize) -> Vec<Cluster<f32>> {
    fibonacci_sphere(n, 0.0)
        .into_iter()
        .enumerate()
        .map(|(i, direction)| {
            let radius = 150.0 + (i % 7) as f32 * 10.0;
            let position = direction.map(|c| c * radius);
            Cluster::new(1.0 + (i % 11) as f32, position)
        })
        .collect()
}

/// Particles spread over a sphere, offset from the clusters. Every fifth one is a secondary.
fn sphere_particles(n: usize) -> Vec<McParticle<f32>> {
    fibonacci_sphere(n, 0.37)
        .into_iter()
        .enumerate()
        .map(|(i, direction)| {
            let status = if i % 5 == 4 { 0 } else { 1 };
            let energy = 2.0 + (i % 13) as f32;
            McParticle::new(status, energy, direction.map(|c| c * energy))
        })
        .collect()
}

fn fibonacci_sphere(n: usize, phase: f32) -> Vec<[f32; 3]> {
    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
    (0..n)
        .map(|i| {
            let z = 1.0 - 2.0 * (i as f32 + 0.5) / n as f32;
            let r = (1.0 - z * z).sqrt();
            let phi = golden_angle * i as f32 + phase;
            [r * phi.cos(), r * phi.sin(), z]
        })
        .collect()
}
