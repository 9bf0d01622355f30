use crate::core::logging::init_test_logger;
use crate::entity::bones::{resolve_joint, resolve_root, BoneTracker, PlayerBone, SkeletonLayout};
use crate::scatter::{read_ptr_chain, read_string, transliterate_cyrillic, ScatterPlan, StringLayout};
use crate::tests::mock_channel::MockChannel;
use glam::{Mat4, Vec3};

#[test]
fn test_three_round_chain_issues_one_call_per_round() {
    init_test_logger();
    let mock = MockChannel::new();
    mock.write_u64(0x500, 0x1000);
    mock.write_u64(0x1008, 0x2000);
    mock.write(0x2010, 77u32);

    let mut plan = ScatterPlan::new(3);
    let first = plan.round(0).add_entry::<u64>(0, 0, 0x500u64, &[]);
    let second = plan.round(1).add_entry::<u64>(0, 1, first, &[0x8]);
    plan.round(2).add_entry::<u32>(0, 2, second, &[0x10]);

    let stats = plan.execute(&mock);

    assert_eq!(mock.batch_calls(), 3);
    assert_eq!(stats.rounds_issued, 3);
    let calls = mock.calls();
    assert_eq!(calls[1].len(), 1);
    assert_eq!(calls[1][0].address - 0x8, 0x1000);
    assert_eq!(calls[2][0].address, 0x2010);
    assert_eq!(plan.try_get::<u64>(0, 0), Some(0x1000));
    assert_eq!(plan.try_get::<u32>(0, 2), Some(77));
}

#[test]
fn test_round_two_reads_at_decoded_address() {
    let mock = MockChannel::new();
    mock.write_u64(0x500, 0x1000);
    mock.write_u64(0x1000, 0x3000);
    mock.write_u64(0x3000, 5);

    let mut plan = ScatterPlan::new(3);
    let first = plan.round(0).add_entry::<u64>(0, 0, 0x500u64, &[]);
    let second = plan.round(1).add_entry::<u64>(0, 1, first, &[]);
    plan.round(2).add_entry::<u64>(0, 2, second, &[]);
    plan.execute(&mock);

    let calls = mock.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1][0].address, 0x1000);
    assert_eq!(plan.try_get::<u64>(0, 2), Some(5));
}

#[test]
fn test_zero_base_skips_dependents_without_reading() {
    let mock = MockChannel::new();
    mock.write_u64(0x500, 0);
    mock.write_u64(0x600, 0x4000);
    mock.write(0x4000, 1.5f32);

    let mut plan = ScatterPlan::new(3);
    let null = plan.round(0).add_entry::<u64>(0, 0, 0x500u64, &[]);
    let good = plan.round(0).add_entry::<u64>(1, 0, 0x600u64, &[]);
    let dependent = plan.round(1).add_entry::<u64>(0, 1, null, &[0x10]);
    plan.round(2).add_entry::<u64>(0, 2, dependent, &[0x10]);
    plan.round(1).add_entry::<f32>(1, 1, good, &[]);

    let stats = plan.execute(&mock);

    // round 2 has nothing left to read, so only two calls are made
    assert_eq!(mock.batch_calls(), 2);
    assert_eq!(stats.entries_skipped, 2);
    assert!(mock.requested_addresses().iter().all(|a| *a >= 0x500));
    assert_eq!(plan.try_get::<u64>(0, 0), Some(0));
    assert_eq!(plan.try_get::<u64>(0, 1), None);
    assert_eq!(plan.try_get::<u64>(0, 2), None);
    assert_eq!(plan.try_get::<f32>(1, 1), Some(1.5));
}

#[test]
fn test_failed_read_propagates_absence() {
    let mock = MockChannel::new();

    let mut plan = ScatterPlan::new(2);
    let missing = plan.round(0).add_entry::<u64>(0, 0, 0x700u64, &[]);
    plan.round(1).add_entry::<u64>(0, 1, missing, &[]);
    let stats = plan.execute(&mock);

    assert_eq!(mock.batch_calls(), 1);
    assert_eq!(stats.entries_failed, 1);
    assert_eq!(stats.entries_skipped, 1);
    assert!(!plan.results().get(0, 1).is_present());
}

#[test]
fn test_empty_plan_makes_no_calls() {
    let mock = MockChannel::new();
    let mut plan = ScatterPlan::new(4);
    let stats = plan.execute(&mock);
    assert_eq!(mock.batch_calls(), 0);
    assert_eq!(stats.rounds_issued, 0);
}

#[test]
fn test_invalid_literal_address_is_skipped() {
    let mock = MockChannel::new();
    let mut plan = ScatterPlan::new(1);
    plan.round(0).add_entry::<u64>(0, 0, 0u64, &[0x10]);
    plan.round(0).add_entry::<u64>(0, 1, 0xFFFF_8000_0000_0000u64, &[]);
    plan.execute(&mock);
    assert_eq!(mock.batch_calls(), 0);
}

#[test]
fn test_auto_rounds_follow_dependency_depth() {
    let mock = MockChannel::new();
    mock.write_u64(0x800, 0x1800);
    mock.write_u64(0x1800, 0x2800);
    mock.write_u64(0x900, 9);

    let mut plan = ScatterPlan::auto();
    let a = plan.add_auto::<u64>(0, 0, 0x800u64, &[]);
    let b = plan.add_auto::<u64>(0, 1, a, &[]);
    plan.add_auto::<u64>(0, 2, b, &[]);
    // independent entry added last still lands in the first round
    let independent = plan.add_auto::<u64>(0, 3, 0x900u64, &[]);

    assert_eq!(plan.round_count(), 3);
    assert_eq!(plan.round_of(independent), Some(0));
    assert_eq!(plan.round_of(b), Some(1));

    plan.execute(&mock);
    assert_eq!(mock.batch_calls(), 3);
    assert_eq!(plan.try_get::<u64>(0, 3), Some(9));
}

#[test]
fn test_try_get_unknown_or_mismatched_is_absent() {
    let mock = MockChannel::new();
    mock.write(0xA00, 3u32);

    let mut plan = ScatterPlan::new(1);
    plan.round(0).add_entry::<u32>(0, 0, 0xA00u64, &[]);
    plan.execute(&mock);

    assert_eq!(plan.try_get::<u32>(0, 0), Some(3));
    assert_eq!(plan.try_get::<u64>(0, 0), None);
    assert_eq!(plan.try_get::<Vec3>(0, 0), None);
    assert_eq!(plan.try_get::<u32>(0, 99), None);
    assert_eq!(plan.try_get::<u32>(7, 0), None);
}

#[test]
fn test_second_execute_is_ignored() {
    let mock = MockChannel::new();
    mock.write_u64(0xB00, 1);
    let mut plan = ScatterPlan::new(1);
    plan.round(0).add_entry::<u64>(0, 0, 0xB00u64, &[]);
    plan.execute(&mock);
    let again = plan.execute(&mock);
    assert_eq!(mock.batch_calls(), 1);
    assert_eq!(again.rounds_issued, 0);
    assert_eq!(plan.try_get::<u64>(0, 0), Some(1));
}

#[test]
fn test_duplicate_entry_keeps_first_registration() {
    let mock = MockChannel::new();
    mock.write_u64(0xC00, 1);
    mock.write_u64(0xD00, 2);
    let mut plan = ScatterPlan::new(1);
    plan.round(0).add_entry::<u64>(0, 0, 0xC00u64, &[]);
    plan.round(0).add_entry::<u64>(0, 0, 0xD00u64, &[]);
    assert_eq!(plan.entry_count(), 1);
    plan.execute(&mock);
    assert_eq!(plan.try_get::<u64>(0, 0), Some(1));
}

#[test]
fn test_read_ptr_chain_and_string() {
    let mock = MockChannel::new();
    let layout = StringLayout::default();
    mock.write_u64(0x1000 + 0x30, 0x2000);
    mock.write_u64(0x2000 + 0x18, 0x3000);
    mock.write_string(0x3000, "Reshala", &layout);

    assert_eq!(read_ptr_chain(&mock, 0x1000, &[0x30, 0x18]), 0x3000);
    assert_eq!(read_ptr_chain(&mock, 0x1000, &[]), 0x1000);
    assert_eq!(read_ptr_chain(&mock, 0x1000, &[0x40, 0x18]), 0);
    assert_eq!(read_string(&mock, 0x3000, &layout).as_deref(), Some("Reshala"));
    assert_eq!(read_string(&mock, 0x9000, &layout), None);
}

#[test]
fn test_skeleton_setup_and_refresh() {
    let mock = MockChannel::new();
    let layout = SkeletonLayout::default();
    let body = 0x10_0000u64;
    let root = 0x20_0000u64;
    mock.write_u64(body + 0x30, 0x11_0000);
    mock.write_u64(0x11_0000 + 0x30, 0x12_0000);
    mock.write_u64(0x12_0000 + 0x10, root);

    let head = PlayerBone::HumanHead;
    let joint = 0x30_0000u64;
    let transform = 0x40_0000u64;
    mock.write_u64(layout.joint_slot_address(root, head), joint);
    mock.write_u64(joint + layout.transform_deref, transform);
    mock.write(transform + layout.matrix_offset, Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));

    let tracker = BoneTracker::setup(&mock, body, &[head, PlayerBone::HumanPelvis], &layout);
    assert_eq!(tracker.root(), root);
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.position(head), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(tracker.position(PlayerBone::HumanPelvis), Vec3::ZERO);

    mock.write(transform + layout.matrix_offset, Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0)));
    mock.clear_calls();
    assert_eq!(tracker.refresh(&mock), 1);
    assert_eq!(mock.batch_calls(), 1);
    assert_eq!(tracker.position(head), Vec3::new(4.0, 5.0, 6.0));
}

#[test]
fn test_resolve_root_and_joint() {
    let mock = MockChannel::new();
    let layout = SkeletonLayout::default();
    let body = 0x10_0000u64;
    let root = 0x20_0000u64;
    mock.write_u64(body + 0x30, 0x11_0000);
    mock.write_u64(0x11_0000 + 0x30, 0x12_0000);
    mock.write_u64(0x12_0000 + 0x10, root);

    let head = PlayerBone::HumanHead;
    let joint = 0x30_0000u64;
    let transform = 0x40_0000u64;
    mock.write_u64(layout.joint_slot_address(root, head), joint);
    mock.write_u64(joint + layout.transform_deref, transform);

    assert_eq!(resolve_root(&mock, body, &layout), root);
    assert_eq!(resolve_joint(&mock, root, head, &layout), transform);
    assert_eq!(resolve_joint(&mock, root, head, &layout), transform);

    // neck slot was never written
    assert_eq!(resolve_joint(&mock, root, PlayerBone::HumanNeck, &layout), 0);
    assert_eq!(resolve_joint(&mock, 0, head, &layout), 0);
    assert_eq!(resolve_root(&mock, 0x50_0000, &layout), 0);
    assert_eq!(resolve_root(&mock, 0, &layout), 0);

    // broken middle link
    mock.write_u64(0x11_0000 + 0x30, 0);
    assert_eq!(resolve_root(&mock, body, &layout), 0);
}

#[test]
fn test_transliteration_is_exported_with_strings() {
    let layout = StringLayout::default();
    mock_name_round_trip(&layout, "Тагилла", "Tagilla");
}

fn mock_name_round_trip(layout: &StringLayout, raw: &str, expected: &str) {
    let mock = MockChannel::new();
    mock.write_string(0x6000, raw, layout);
    let decoded = read_string(&mock, 0x6000, layout).unwrap();
    assert_eq!(transliterate_cyrillic(&decoded), expected);
}
