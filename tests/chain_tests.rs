use glam::{DMat3, DQuat, DVec3};
use kinetic_chain::{Chain, Frame, JointKind, Link, Shape, ShapeKind};

fn diag(x: f64, y: f64, z: f64) -> DMat3 {
    DMat3::from_diagonal(DVec3::new(x, y, z))
}

/// Serial chain exercising every multi-purpose joint kind: fixed root,
/// revolute, cylindrical, universal, spherical. Joint size 8.
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

const MIXED_Q: [f64; 8] = [0.3, -0.4, 0.6, 0.2, -0.3, 0.5, -0.2, 0.4];

#[test]
fn fk_composes_parent_frames() {
    let mut chain = mixed_chain();
    chain.fk(&MIXED_Q).unwrap();
    for i in 1..chain.link_num() {
        let link = chain.link(i);
        let parent = chain.link(link.parent().unwrap());
        let expect = parent
            .wld_frame()
            .combine(&link.org_frame.combine(&link.joint.joint_transform()));
        assert!((expect.pos - link.wld_frame().pos).length() < 1e-12, "link {i}");
        assert!(expect.att.angle_between(link.wld_frame().att) < 1e-12, "link {i}");
    }
}

#[test]
fn offsets_partition_the_packed_vector() {
    let chain = mixed_chain();
    let total = chain.joint_size();
    assert_eq!(total, 8);
    let mut covered = vec![false; total];
    for link in chain.links() {
        match link.offset() {
            None => assert_eq!(link.joint_size(), 0),
            Some(off) => {
                assert!(link.joint_size() > 0);
                for c in off..off + link.joint_size() {
                    assert!(!covered[c], "offset overlap at column {c}");
                    covered[c] = true;
                }
            }
        }
    }
    assert!(covered.iter().all(|&c| c));
}

#[test]
fn com_is_the_mass_weighted_mean() {
    let mut chain = mixed_chain();
    chain.fk(&MIXED_Q).unwrap();
    let weighted: DVec3 = chain
        .links()
        .iter()
        .map(|l| l.mass * l.wld_com())
        .sum::<DVec3>();
    assert!((chain.mass() * chain.wld_com() - weighted).length() < 1e-12);
}

#[test]
fn clone_runs_bit_identical() {
    let mut chain = mixed_chain();
    let mut copy = chain.clone();
    let vel = [0.2, -0.1, 0.3, 0.15, -0.25, 0.1, 0.2, -0.3];
    let acc = [0.5, 0.4, -0.2, 0.3, 0.1, -0.4, 0.25, 0.35];
    for c in [&mut chain, &mut copy] {
        c.fk(&MIXED_Q).unwrap();
        c.id(&vel, &acc).unwrap();
    }
    assert_eq!(chain.get_joint_trq_all(), copy.get_joint_trq_all());
    assert_eq!(chain.wld_com(), copy.wld_com());
    assert_eq!(chain.com_vel(), copy.com_vel());
    assert_eq!(chain.com_acc(), copy.com_acc());
    assert_eq!(chain.kinetic_energy(), copy.kinetic_energy());
}

#[test]
fn conf_round_trip_recovers_displacements() {
    let mut chain = mixed_chain();
    chain.fk(&MIXED_Q).unwrap();
    let conf = chain.get_conf();
    let mut other = mixed_chain();
    other.set_conf(&conf).unwrap();
    let dis = other.get_joint_dis_all();
    for (i, (&got, &want)) in dis.iter().zip(MIXED_Q.iter()).enumerate() {
        assert!((got - want).abs() < 1e-9, "column {i}: {got} vs {want}");
    }
}

#[test]
fn copy_state_transfers_dynamics() {
    let mut chain = mixed_chain();
    let vel = [0.2, -0.1, 0.3, 0.15, -0.25, 0.1, 0.2, -0.3];
    let acc = [0.0; 8];
    chain.fk(&MIXED_Q).unwrap();
    chain.id(&vel, &acc).unwrap();
    let mut other = mixed_chain();
    other.copy_state_from(&chain).unwrap();
    assert_eq!(other.get_joint_dis_all(), chain.get_joint_dis_all());
    assert_eq!(other.get_joint_trq_all(), chain.get_joint_trq_all());
    for i in 0..chain.link_num() {
        assert_eq!(other.link(i).wrench(), chain.link(i).wrench());
        assert_eq!(other.link(i).vel(), chain.link(i).vel());
    }
}

#[test]
fn cat_then_sub_round_trips_on_manifolds() {
    let chain = mixed_chain();
    let a = MIXED_Q.to_vec();
    let b = [0.1, 0.2, -0.3, 0.4, 0.1, -0.2, 0.3, -0.1];
    let mut diff = a.clone();
    chain.sub_joint_dis_all(&mut diff, &b).unwrap();
    let mut rebuilt = b.to_vec();
    chain.cat_joint_dis_all(&mut rebuilt, 1.0, &diff).unwrap();
    // Compare through each joint transform so rotation-vector encodings
    // are judged on the manifold.
    let mut lhs = mixed_chain();
    let mut rhs = mixed_chain();
    lhs.fk(&a).unwrap();
    rhs.fk(&rebuilt).unwrap();
    for i in 0..lhs.link_num() {
        assert!(
            lhs.link(i)
                .wld_frame()
                .att
                .angle_between(rhs.link(i).wld_frame().att)
                < 1e-9
        );
        assert!((lhs.link(i).wld_frame().pos - rhs.link(i).wld_frame().pos).length() < 1e-9);
    }
}

#[test]
fn sparse_continuous_update_infers_rates() {
    let mut chain = mixed_chain();
    let index = chain.default_joint_index();
    assert_eq!(index, vec![1, 2, 3, 4]);
    chain.set_joint_dis(&index, &MIXED_Q).unwrap();
    let dt = 1e-3;
    let mut moved = MIXED_Q;
    moved[0] += 0.5 * dt;
    chain.set_joint_dis_cnt(&index, &moved, dt).unwrap();
    let vel = chain.get_joint_vel(&index);
    assert!((vel[0] - 0.5).abs() < 1e-9);
    assert!(vel[1].abs() < 1e-9);
}

#[test]
fn size_mismatch_is_reported_not_applied() {
    let mut chain = mixed_chain();
    chain.fk(&MIXED_Q).unwrap();
    let before = chain.get_joint_dis_all();
    assert!(chain.set_joint_dis_all(&[0.0; 5]).is_err());
    assert_eq!(chain.get_joint_dis_all(), before);
}

#[test]
fn vertex_list_and_bounding_ball_follow_shapes() {
    let mut chain = Chain::new("boxy");
    chain.add_link(Link::new("base", JointKind::Fixed), None);
    let mut arm = Link::new("arm", JointKind::Revolute);
    arm.mass = 1.0;
    arm.org_frame = Frame::from_pos(DVec3::new(2.0, 0.0, 0.0));
    let si = chain.add_shape(Shape::new(
        "block",
        ShapeKind::Box {
            half_extents: DVec3::splat(0.5),
        },
    ));
    let arm_idx = chain.add_link(arm, Some(0));
    chain.link_mut(arm_idx).shapes.push(si);
    chain.initialize().unwrap();

    let verts = chain.vert_list();
    assert_eq!(verts.len(), 8);
    let ball = chain.bounding_ball().unwrap();
    assert!((ball.center - DVec3::new(2.0, 0.0, 0.0)).length() < 1e-9);
    assert!((ball.radius - 0.75f64.sqrt()).abs() < 1e-9);

    // A chain without shapes has no bounding ball.
    let bare = mixed_chain();
    assert!(bare.bounding_ball().is_none());
}
