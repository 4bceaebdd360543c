use approx::assert_relative_eq;
use glam::{DMat3, DQuat, DVec3};
use kinetic_chain::utils::math::{quat_from_rotvec, rotvec_from_quat};
use kinetic_chain::{Chain, ExtWrench, Frame, JointKind, Link};
use nalgebra::{DMatrix, DVector};
use std::f64::consts::FRAC_PI_2;

fn diag(x: f64, y: f64, z: f64) -> DMat3 {
    DMat3::from_diagonal(DVec3::new(x, y, z))
}

const G: f64 = 9.8;

/// Single revolute link of mass 1, length 1 along X, inertia identity.
/// The origin attitude turns the joint axis horizontal so gravity loads
/// the joint: the link swings in the world X–Z plane.
fn pendulum() -> Chain {
    let mut chain = Chain::new("pendulum");
    chain.gravity = DVec3::new(0.0, 0.0, -G);
    chain.add_link(Link::new("base", JointKind::Fixed), None);
    let mut arm = Link::new("arm", JointKind::Revolute);
    arm.mass = 1.0;
    arm.com = DVec3::new(0.5, 0.0, 0.0);
    arm.inertia = DMat3::IDENTITY;
    arm.org_frame = Frame::from_att(DQuat::from_rotation_x(FRAC_PI_2));
    chain.add_link(arm, Some(0));
    chain.initialize().unwrap();
    chain
}

/// Planar two-revolute arm: unit masses, unit lengths, uniform-rod
/// inertia, joint axes along world Z so gravity drops out of the torques.
fn two_link_arm() -> Chain {
    let rod = diag(0.0, 1.0 / 12.0, 1.0 / 12.0);
    let mut chain = Chain::new("planar2r");
    chain.gravity = DVec3::new(0.0, 0.0, -G);
    chain.add_link(Link::new("base", JointKind::Fixed), None);
    let mut upper = Link::new("upper", JointKind::Revolute);
    upper.mass = 1.0;
    upper.com = DVec3::new(0.5, 0.0, 0.0);
    upper.inertia = rod;
    let upper = chain.add_link(upper, Some(0));
    let mut lower = Link::new("lower", JointKind::Revolute);
    lower.mass = 1.0;
    lower.com = DVec3::new(0.5, 0.0, 0.0);
    lower.inertia = rod;
    lower.org_frame = Frame::from_pos(DVec3::X);
    chain.add_link(lower, Some(upper));
    chain.initialize().unwrap();
    chain
}

/// Serial chain mixing revolute, cylindrical, universal, and spherical
/// joints (joint size 8) with offset, tilted origin frames.
fn mixed_chain() -> Chain {
    let mut chain = Chain::new("mixed");
    let mut base = Link::new("base", JointKind::Fixed);
    base.mass = 0.8;
    base.com = DVec3::new(0.0, 0.0, 0.1);
    base.inertia = diag(0.01, 0.01, 0.01);
    chain.add_link(base, None);
    let mut shoulder = Link::new("shoulder", JointKind::Revolute);
    shoulder.mass = 1.2;
    shoulder.com = DVec3::new(0.15, 0.0, 0.05);
    shoulder.inertia = diag(0.02, 0.025, 0.03);
    shoulder.org_frame = Frame::new(DVec3::new(0.0, 0.0, 0.4), DQuat::from_rotation_x(0.5));
    let shoulder = chain.add_link(shoulder, Some(0));
    let mut slide = Link::new("slide", JointKind::Cylindrical);
    slide.mass = 0.7;
    slide.com = DVec3::new(0.0, 0.1, 0.2);
    slide.inertia = diag(0.01, 0.015, 0.02);
    slide.org_frame = Frame::new(DVec3::new(0.3, 0.0, 0.0), DQuat::from_rotation_y(-0.3));
    let slide = chain.add_link(slide, Some(shoulder));
    let mut tool = Link::new("tool", JointKind::Universal);
    tool.mass = 0.5;
    tool.com = DVec3::new(0.05, 0.05, 0.0);
    tool.inertia = diag(0.008, 0.009, 0.01);
    tool.org_frame = Frame::new(DVec3::new(0.0, 0.2, 0.1), DQuat::from_rotation_z(0.8));
    let tool = chain.add_link(tool, Some(slide));
    let mut wrist = Link::new("wrist", JointKind::Spherical);
    wrist.mass = 0.4;
    wrist.com = DVec3::new(0.0, 0.0, 0.1);
    wrist.inertia = diag(0.005, 0.006, 0.007);
    wrist.org_frame = Frame::from_pos(DVec3::new(0.0, 0.0, 0.25));
    chain.add_link(wrist, Some(tool));
    chain.initialize().unwrap();
    chain
}

#[test]
fn pendulum_gravity_torque() {
    let mut chain = pendulum();
    for q in [0.0, 0.5, FRAC_PI_2, 2.0] {
        chain.fk(&[q]).unwrap();
        chain.id(&[0.0], &[0.0]).unwrap();
        let trq = chain.get_joint_trq_all()[0];
        // Holding torque against gravity: m·g·(L/2)·cos q.
        assert_relative_eq!(trq, G * 0.5 * q.cos(), epsilon = 1e-9);
    }
}

#[test]
fn pendulum_inertial_torque() {
    let mut chain = pendulum();
    chain.fk(&[0.3]).unwrap();
    chain.id(&[0.0], &[2.0]).unwrap();
    // I about the joint axis: Izz(com) + m·(L/2)² = 1.25.
    let expect = 1.25 * 2.0 + G * 0.5 * 0.3f64.cos();
    assert_relative_eq!(chain.get_joint_trq_all()[0], expect, epsilon = 1e-9);
}

#[test]
fn two_link_mass_matrix_closed_form() {
    // Standard planar 2R model with Izz = 1/12, COM mid-link:
    //   H11 = Izz + m·Lc² + Izz + m·(L² + Lc² + 2·L·Lc·cos q2)
    //   H12 = Izz + m·(Lc² + L·Lc·cos q2)
    //   H22 = Izz + m·Lc²
    let mut chain = two_link_arm();
    chain.fk(&[0.0, 0.0]).unwrap();
    chain.zero_joint_vel_all();
    let n = chain.joint_size();
    let mut h = DMatrix::zeros(n, n);
    let mut bias = DVector::zeros(n);
    chain.inertia_mat_bias_vec(&mut h, &mut bias).unwrap();
    assert_relative_eq!(h[(0, 0)], 8.0 / 3.0, epsilon = 1e-9);
    assert_relative_eq!(h[(0, 1)], 5.0 / 6.0, epsilon = 1e-9);
    assert_relative_eq!(h[(1, 0)], 5.0 / 6.0, epsilon = 1e-9);
    assert_relative_eq!(h[(1, 1)], 1.0 / 3.0, epsilon = 1e-9);
    // Vertical joint axes: gravity exerts no torque at rest.
    assert!(bias.amax() < 1e-9);
    // τ from the RNE at q̈ = e₁ equals the first column.
    chain.id(&[0.0, 0.0], &[1.0, 0.0]).unwrap();
    let trq = chain.get_joint_trq_all();
    assert_relative_eq!(trq[0], 8.0 / 3.0, epsilon = 1e-9);
    assert_relative_eq!(trq[1], 5.0 / 6.0, epsilon = 1e-9);
}

#[test]
fn two_link_off_zero_posture() {
    let q2: f64 = 0.9;
    let mut chain = two_link_arm();
    chain.fk(&[0.4, q2]).unwrap();
    chain.zero_joint_vel_all();
    let mut h = DMatrix::zeros(2, 2);
    let mut bias = DVector::zeros(2);
    chain.inertia_mat_bias_vec(&mut h, &mut bias).unwrap();
    let izz = 1.0 / 12.0;
    let h11 = izz + 0.25 + izz + (1.0 + 0.25 + q2.cos());
    let h12 = izz + 0.25 + 0.5 * q2.cos();
    let h22 = izz + 0.25;
    assert_relative_eq!(h[(0, 0)], h11, epsilon = 1e-9);
    assert_relative_eq!(h[(0, 1)], h12, epsilon = 1e-9);
    assert_relative_eq!(h[(1, 1)], h22, epsilon = 1e-9);
}

const MIXED_Q: [f64; 8] = [0.3, -0.4, 0.6, 0.2, -0.3, 0.5, -0.2, 0.4];
const MIXED_QD: [f64; 8] = [0.2, -0.1, 0.3, 0.15, -0.25, 0.1, 0.2, -0.3];

#[test]
fn mass_matrix_is_symmetric_and_positive_definite() {
    let mut chain = mixed_chain();
    chain.fk(&MIXED_Q).unwrap();
    chain.set_joint_vel_all(&MIXED_QD).unwrap();
    let n = chain.joint_size();
    let mut h = DMatrix::zeros(n, n);
    let mut bias = DVector::zeros(n);
    chain.inertia_mat_bias_vec(&mut h, &mut bias).unwrap();
    for r in 0..n {
        for c in 0..n {
            assert_relative_eq!(h[(r, c)], h[(c, r)], epsilon = 1e-9);
        }
    }
    for seed in 0..n {
        let x = DVector::from_fn(n, |i, _| ((i + seed) as f64 * 0.7).sin() + 0.1);
        let quad = x.dot(&(&h * &x));
        assert!(quad > 0.0, "xᵀHx = {quad} for seed {seed}");
    }
}

#[test]
fn rne_matches_mass_matrix_form() {
    // τ = H(q)·q̈ + h(q, q̇) for an arbitrary acceleration, on a chain
    // covering four joint kinds.
    let qdd = [0.5, 0.4, -0.2, 0.3, 0.1, -0.4, 0.25, 0.35];
    let mut chain = mixed_chain();
    chain.fk(&MIXED_Q).unwrap();
    chain.set_joint_vel_all(&MIXED_QD).unwrap();
    let n = chain.joint_size();
    let mut h = DMatrix::zeros(n, n);
    let mut bias = DVector::zeros(n);
    chain.inertia_mat_bias_vec(&mut h, &mut bias).unwrap();
    chain.id(&MIXED_QD, &qdd).unwrap();
    let trq = chain.get_joint_trq_all();
    let expect = &h * DVector::from_column_slice(&qdd) + &bias;
    for i in 0..n {
        assert_relative_eq!(trq[i], expect[i], epsilon = 1e-8);
    }
}

#[test]
fn sizing_violation_leaves_outputs_untouched() {
    let mut chain = mixed_chain();
    let mut h = DMatrix::from_element(3, 3, 7.0);
    let mut bias = DVector::from_element(3, 7.0);
    assert!(chain.inertia_mat_bias_vec(&mut h, &mut bias).is_err());
    assert!(h.iter().all(|&v| v == 7.0));
    assert!(bias.iter().all(|&v| v == 7.0));
}

/// Chain of vector-encoded joints only (revolute, cylindrical, universal),
/// so packed coordinates move linearly in time under constant rates.
fn fd_chain() -> Chain {
    let chain = mixed_chain();
    // Re-purpose the mixed chain by replacing the spherical wrist with a
    // second revolute, keeping the rest of the geometry.
    let mut joints = Chain::new("fd");
    for (i, link) in chain.links().iter().enumerate() {
        let mut l = Link::new(
            &link.name,
            if link.joint.kind() == JointKind::Spherical {
                JointKind::Revolute
            } else {
                link.joint.kind()
            },
        );
        l.mass = link.mass;
        l.com = link.com;
        l.inertia = link.inertia;
        l.org_frame = link.org_frame;
        joints.add_link(l, if i == 0 { None } else { Some(i - 1) });
    }
    joints.gravity = chain.gravity;
    joints.initialize().unwrap();
    joints
}

#[test]
fn com_velocity_matches_finite_difference() {
    let mut chain = fd_chain();
    let n = chain.joint_size();
    let q = &MIXED_Q[..n];
    let qd = &MIXED_QD[..n];
    chain.fk(q).unwrap();
    chain.id(qd, &vec![0.0; n]).unwrap();
    let vel = chain.com_vel();

    let dt = 1e-6;
    let mut probe = chain.clone();
    let shift = |probe: &mut Chain, sign: f64| -> DVec3 {
        let moved: Vec<f64> = q.iter().zip(qd).map(|(&x, &v)| x + sign * dt * v).collect();
        probe.fk(&moved).unwrap();
        probe.wld_com()
    };
    let fd = (shift(&mut probe, 1.0) - shift(&mut probe, -1.0)) / (2.0 * dt);
    assert!((vel - fd).length() < 1e-8, "vel {vel:?} vs fd {fd:?}");
}

#[test]
fn com_acceleration_matches_finite_difference() {
    let mut chain = fd_chain();
    chain.gravity = DVec3::ZERO;
    let n = chain.joint_size();
    let q = &MIXED_Q[..n];
    let qd = &MIXED_QD[..n];
    chain.fk(q).unwrap();
    chain.id(qd, &vec![0.0; n]).unwrap();
    let acc = chain.com_acc();

    let dt = 1e-4;
    let mut probe = chain.clone();
    let sample = |probe: &mut Chain, sign: f64| -> DVec3 {
        let moved: Vec<f64> = q.iter().zip(qd).map(|(&x, &v)| x + sign * dt * v).collect();
        probe.fk(&moved).unwrap();
        probe.wld_com()
    };
    let ahead = sample(&mut probe, 1.0);
    let behind = sample(&mut probe, -1.0);
    probe.fk(q).unwrap();
    let center = probe.wld_com();
    let fd = (ahead - 2.0 * center + behind) / (dt * dt);
    assert!((acc - fd).length() < 1e-6, "acc {acc:?} vs fd {fd:?}");
}

#[test]
fn spherical_com_velocity_matches_finite_difference() {
    let mut chain = Chain::new("spherical");
    chain.add_link(Link::new("base", JointKind::Fixed), None);
    let mut ball = Link::new("ball", JointKind::Spherical);
    ball.mass = 1.0;
    ball.com = DVec3::new(0.2, -0.1, 0.3);
    ball.inertia = diag(0.01, 0.02, 0.03);
    ball.org_frame = Frame::from_pos(DVec3::new(0.0, 0.0, 0.5));
    chain.add_link(ball, Some(0));
    chain.initialize().unwrap();

    let q = DVec3::new(0.3, -0.2, 0.4);
    let omega = DVec3::new(0.2, 0.5, -0.3); // child-frame angular velocity
    chain.fk(&q.to_array()).unwrap();
    chain
        .id(&omega.to_array(), &[0.0, 0.0, 0.0])
        .unwrap();
    let vel = chain.com_vel();

    // Walk the manifold path R(t) = R(0)·exp(t·ω) and difference the
    // world COM through a probe chain.
    let dt = 1e-6;
    let r0 = quat_from_rotvec(q);
    let mut probe = chain.clone();
    let mut sample = |sign: f64| -> DVec3 {
        let r = r0 * quat_from_rotvec(omega * (sign * dt));
        probe.fk(&rotvec_from_quat(r).to_array()).unwrap();
        probe.wld_com()
    };
    let fd = (sample(1.0) - sample(-1.0)) / (2.0 * dt);
    assert!((vel - fd).length() < 1e-8, "vel {vel:?} vs fd {fd:?}");
}

#[test]
fn free_base_com_velocity_matches_finite_difference() {
    let mut chain = Chain::new("floating");
    let mut torso = Link::new("torso", JointKind::Free);
    torso.mass = 2.0;
    torso.com = DVec3::new(0.1, 0.0, 0.2);
    torso.inertia = diag(0.04, 0.05, 0.06);
    chain.add_link(torso, None);
    let mut limb = Link::new("limb", JointKind::Revolute);
    limb.mass = 0.5;
    limb.com = DVec3::new(0.3, 0.0, 0.0);
    limb.inertia = diag(0.01, 0.01, 0.01);
    limb.org_frame = Frame::from_pos(DVec3::new(0.2, 0.0, 0.0));
    chain.add_link(limb, Some(0));
    chain.initialize().unwrap();

    let pos = DVec3::new(0.1, 0.2, 0.3);
    let rv = DVec3::new(0.2, -0.1, 0.15);
    let q = [pos.x, pos.y, pos.z, rv.x, rv.y, rv.z, 0.4];
    let v_lin = DVec3::new(0.3, -0.2, 0.1); // child frame
    let v_ang = DVec3::new(0.1, 0.25, -0.2); // child frame
    let qd = [v_lin.x, v_lin.y, v_lin.z, v_ang.x, v_ang.y, v_ang.z, 0.5];
    chain.fk(&q).unwrap();
    chain.id(&qd, &[0.0; 7]).unwrap();
    let vel = chain.com_vel();

    let dt = 1e-6;
    let r0 = quat_from_rotvec(rv);
    let mut probe = chain.clone();
    let mut sample = |sign: f64| -> DVec3 {
        let p = pos + (sign * dt) * (r0 * v_lin);
        let r = r0 * quat_from_rotvec(v_ang * (sign * dt));
        let rvec = rotvec_from_quat(r);
        let moved = [p.x, p.y, p.z, rvec.x, rvec.y, rvec.z, 0.4 + sign * dt * 0.5];
        probe.fk(&moved).unwrap();
        probe.wld_com()
    };
    let fd = (sample(1.0) - sample(-1.0)) / (2.0 * dt);
    assert!((vel - fd).length() < 1e-8, "vel {vel:?} vs fd {fd:?}");
}

#[test]
fn static_zmp_is_the_com_ground_projection() {
    let mut chain = pendulum();
    for q in [0.0, 0.7, 1.9] {
        chain.fk(&[q]).unwrap();
        chain.id(&[0.0], &[0.0]).unwrap();
        let zmp = chain.zmp(0.0).unwrap();
        let com = chain.wld_com();
        assert_relative_eq!(zmp.x, com.x, epsilon = 1e-9);
        assert_relative_eq!(zmp.y, com.y, epsilon = 1e-9);
        assert_relative_eq!(zmp.z, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn zmp_is_undefined_without_contact_force() {
    let mut chain = pendulum();
    chain.gravity = DVec3::ZERO;
    chain.fk(&[0.4]).unwrap();
    chain.id(&[0.0], &[0.0]).unwrap();
    assert!(chain.zmp(0.0).is_none());
}

#[test]
fn free_base_at_rest() {
    let mut chain = Chain::new("floating");
    chain.gravity = DVec3::new(0.0, 0.0, -G);
    let mut torso = Link::new("torso", JointKind::Free);
    torso.mass = 1.0;
    torso.com = DVec3::new(0.2, 0.3, 0.5);
    torso.inertia = diag(0.1, 0.1, 0.1);
    chain.add_link(torso, None);
    let mut limb = Link::new("limb", JointKind::Revolute);
    limb.mass = 0.0;
    limb.org_frame = Frame::from_pos(DVec3::X);
    chain.add_link(limb, Some(0));
    chain.initialize().unwrap();

    // All joints neutral: the base sits at the world origin and the COM is
    // the configured one.
    assert!(chain.root_frame().is_identity());
    assert!((chain.wld_com() - DVec3::new(0.2, 0.3, 0.5)).length() < 1e-12);
    // Balanced and static, the ZMP is the COM ground projection.
    let zmp = chain.zmp(0.0).unwrap();
    assert_relative_eq!(zmp.x, 0.2, epsilon = 1e-9);
    assert_relative_eq!(zmp.y, 0.3, epsilon = 1e-9);
}

#[test]
fn fk_cnt_is_stationary_across_wraparound() {
    use std::f64::consts::TAU;
    let mut chain = two_link_arm();
    let dt = 1e-3;
    chain.fk(&[0.3, 0.5]).unwrap();
    chain.fk_cnt(&[0.3, 0.5], dt).unwrap();
    chain.fk_cnt(&[0.3 + TAU, 0.5 - TAU], dt).unwrap();
    let vel = chain.get_joint_vel_all();
    assert!(vel[0].abs() < 1e-9);
    assert!(vel[1].abs() < 1e-9);
    // And a genuine step is differentiated.
    chain.fk_cnt(&[0.3 + 2.0 * dt, 0.5], dt).unwrap();
    assert_relative_eq!(chain.get_joint_vel_all()[0], 2.0, epsilon = 1e-9);
}

#[test]
fn spinning_rotor_momentum_and_energy() {
    let mut chain = Chain::new("rotor");
    chain.gravity = DVec3::new(0.0, 0.0, -G);
    chain.add_link(Link::new("stator", JointKind::Fixed), None);
    let mut rotor = Link::new("rotor", JointKind::Revolute);
    rotor.mass = 1.0;
    rotor.inertia = diag(1.0, 1.0, 2.0);
    chain.add_link(rotor, Some(0));
    chain.initialize().unwrap();

    chain.fk(&[0.0]).unwrap();
    chain.id(&[3.0], &[0.0]).unwrap();
    let am = chain.angular_momentum(DVec3::ZERO);
    assert!((am - DVec3::new(0.0, 0.0, 6.0)).length() < 1e-9);
    assert_relative_eq!(chain.kinetic_energy(), 9.0, epsilon = 1e-9);

    // Yaw torque appears while the rotor spins up.
    chain.id(&[0.0], &[3.0]).unwrap();
    let yaw = chain.yaw_torque().unwrap();
    assert_relative_eq!(yaw, G, epsilon = 1e-9);
}

#[test]
fn yaw_torque_is_undefined_for_level_torque() {
    // A static pendulum's root torque is horizontal, so the quotient has
    // no vertical component to divide by.
    let mut chain = pendulum();
    chain.fk(&[0.3]).unwrap();
    chain.id(&[0.0], &[0.0]).unwrap();
    assert!(chain.yaw_torque().is_none());
}

#[test]
fn external_wrench_enters_the_torque_balance() {
    let mut chain = pendulum();
    chain.fk(&[0.0]).unwrap();
    chain.id(&[0.0], &[0.0]).unwrap();
    let plain = chain.get_joint_trq_all()[0];
    // Push up at the tip with exactly the weight: the support torque at
    // the joint doubles the moment arm ratio away.
    let arm = chain.find_link("arm").unwrap();
    let lift = chain.link(arm).wld_frame().att.inverse() * DVec3::new(0.0, 0.0, G);
    chain
        .link_mut(arm)
        .add_ext_wrench(ExtWrench::force_at(lift, DVec3::X));
    chain.update_id();
    let loaded = chain.get_joint_trq_all()[0];
    assert_relative_eq!(loaded, plain - G, epsilon = 1e-9);

    // The net external wrench reports in world coordinates at the origin.
    let net = chain.net_ext_wrench();
    assert!((net.lin - DVec3::new(0.0, 0.0, G)).length() < 1e-9);
    chain.clear_ext_wrenches();
    chain.update_id();
    assert_relative_eq!(chain.get_joint_trq_all()[0], plain, epsilon = 1e-9);
}

#[test]
fn zero_acc_point_acceleration_is_minus_gravity() {
    let mut chain = pendulum();
    chain.fk(&[0.2]).unwrap();
    chain.zero_joint_vel_all();
    let a0 = chain.link_zero_acc(0, DVec3::ZERO);
    assert!((a0.lin - DVec3::new(0.0, 0.0, G)).length() < 1e-9);
    assert!(a0.ang.length() < 1e-9);
}
