//! End-to-end tests of the controller against the simulated platform.

use ispif::sim::SimPlatform;
use ispif::{
    AppliedCommand, IdlePollConfig, Ispif, IspifCommand, IspifConfig, IspifError, RoutingEntry,
    RoutingRequest,
};
use ispif_core::{ChannelId, ChannelSet, InterfaceLane, VfeInstance};

const INTF_CMD: u32 = 0x248;
const INTF_CMD_1: u32 = 0x24C;
const RDI0_CID_MASK: u32 = 0x264;
const RDI2_CID_MASK: u32 = 0x26C;

fn fast_config() -> IspifConfig {
    IspifConfig {
        reset_timeout_ms: 20,
        idle_poll: IdlePollConfig {
            timeout_ms: 20,
            initial_backoff_us: 10,
            max_backoff_us: 200,
        },
        debug_dump: false,
    }
}

fn ispif() -> Ispif<SimPlatform> {
    Ispif::new(SimPlatform::new(), fast_config())
}

fn request(vfe: VfeInstance, entries: &[(InterfaceLane, u8, &[u8])]) -> RoutingRequest {
    RoutingRequest::new(
        vfe,
        entries
            .iter()
            .map(|&(lane, csid, ids)| {
                let channels: ChannelSet = ids.iter().map(|&id| ChannelId::new(id).unwrap()).collect();
                RoutingEntry::new(lane, csid, channels)
            })
            .collect(),
    )
}

fn field(word: u32, shift: u32) -> u32 {
    (word >> shift) & 0b11
}

#[test]
fn v2_scenario() {
    let ispif = ispif();
    let sim = ispif.platform();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi0, 1, &[2])]);

    ispif.init(2).unwrap();
    assert!(ispif.is_up());
    assert_eq!(sim.sim_clocks().enabled().len(), 5);
    assert_eq!(sim.registers().writes_to(0x008), vec![0xFE0F_1FFF]);

    ispif.configure(&req).unwrap();
    assert_eq!(sim.registers().peek(RDI0_CID_MASK), 1 << 2);
    assert_eq!(sim.sim_clocks().rate("csi_rdi_clk"), Some(1));

    sim.registers().raise_sof(VfeInstance::Vfe0, InterfaceLane::Rdi0);
    ispif.start_frame_boundary(&req).unwrap();
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Rdi0), 0);
    let primary = ispif.applied_command(VfeInstance::Vfe0).primary;
    assert_eq!(field(primary, 4), 0b01);
    assert_eq!(sim.registers().writes_to(INTF_CMD).last(), Some(&primary));

    let snap = sim.registers().raise_sof(VfeInstance::Vfe0, InterfaceLane::Rdi0).unwrap();
    assert_ne!(snap.status[0][0], 0);
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Rdi0), 1);

    ispif.stop_frame_boundary(&req).unwrap();
    assert_eq!(field(ispif.applied_command(VfeInstance::Vfe0).primary, 4), 0b00);
    assert_eq!(sim.registers().peek(RDI0_CID_MASK) & (1 << 2), 0);

    ispif.release().unwrap();
    assert!(!ispif.is_up());
    assert_eq!(ispif.version(), None);
    assert!(sim.sim_clocks().enabled().is_empty());
    assert!(!sim.is_mapped());
    assert!(!sim.irq_installed());
}

#[test]
fn vfe1_rejected_before_v3() {
    for code in [1, 2] {
        let ispif = ispif();
        ispif.init(code).unwrap();
        ispif.platform().registers().clear_writes();

        let req = request(VfeInstance::Vfe1, &[(InterfaceLane::Rdi0, 0, &[0])]);
        assert_eq!(ispif.configure(&req), Err(IspifError::InvalidInterface));
        assert_eq!(ispif.start_frame_boundary(&req), Err(IspifError::InvalidInterface));
        assert_eq!(ispif.stop_frame_boundary(&req), Err(IspifError::InvalidInterface));
        assert_eq!(ispif.stop_immediately(&req), Err(IspifError::InvalidInterface));
        assert!(ispif.platform().registers().writes().is_empty());
    }
}

#[test]
fn sentinel_word_is_never_written() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi2, 0, &[1])]);
    ispif.start_frame_boundary(&req).unwrap();

    let regs = ispif.platform().registers();
    assert!(regs.writes_to(INTF_CMD).is_empty());
    let secondary = regs.writes_to(INTF_CMD_1);
    assert_eq!(secondary.len(), 1);
    assert_ne!(secondary[0], AppliedCommand::SENTINEL);
    assert_eq!(field(secondary[0], 10), 0b01);
    assert_eq!(secondary[0] | (0b11 << 10), AppliedCommand::SENTINEL);
    assert_eq!(
        ispif.applied_command(VfeInstance::Vfe0).primary,
        AppliedCommand::SENTINEL
    );
}

#[test]
fn double_init_leaves_state_alone() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Pix0, 0, &[0])]);
    ispif.start_frame_boundary(&req).unwrap();
    ispif.platform().registers().raise_sof(VfeInstance::Vfe0, InterfaceLane::Pix0);
    let applied = ispif.applied_command(VfeInstance::Vfe0);

    assert_eq!(ispif.init(2), Err(IspifError::AlreadyUp));
    assert_eq!(ispif.init(3), Err(IspifError::AlreadyUp));
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Pix0), 1);
    assert_eq!(ispif.applied_command(VfeInstance::Vfe0), applied);
}

#[test]
fn busy_lane_is_not_configured() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let regs = ispif.platform().registers();
    regs.hold_lane_busy(VfeInstance::Vfe0, InterfaceLane::Rdi0);

    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi0, 0, &[3])]);
    assert_eq!(ispif.configure(&req), Err(IspifError::Busy(InterfaceLane::Rdi0)));
    assert_eq!(regs.peek(RDI0_CID_MASK), 0);
    assert!(regs.writes_to(RDI0_CID_MASK).is_empty());
}

#[test]
fn rdi0_channel5_start_then_stop_immediately() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi0, 0, &[5])]);
    ispif.configure(&req).unwrap();
    assert_eq!(ispif.platform().registers().peek(RDI0_CID_MASK), 1 << 5);

    ispif.start_frame_boundary(&req).unwrap();
    assert_eq!(field(ispif.applied_command(VfeInstance::Vfe0).primary, 2), 0b01);

    ispif.stop_immediately(&req).unwrap();
    let primary = ispif.applied_command(VfeInstance::Vfe0).primary;
    assert_eq!(field(primary, 2), 0b10);
    assert_eq!(ispif.platform().registers().writes_to(INTF_CMD).last(), Some(&primary));
    assert_eq!(ispif.platform().registers().peek(RDI0_CID_MASK) & (1 << 5), 0);
}

#[test]
fn reset_timeout_unwinds_and_retry_succeeds() {
    let ispif = ispif();
    let sim = ispif.platform();
    sim.registers().set_reset_response(false);

    assert_eq!(ispif.init(2), Err(IspifError::ResetTimeout));
    assert!(!ispif.is_up());
    assert!(sim.sim_clocks().enabled().is_empty());
    assert!(!sim.is_mapped());
    assert!(!sim.irq_installed());

    sim.registers().set_reset_response(true);
    ispif.init(2).unwrap();
    assert!(ispif.is_up());
}

#[test]
fn release_powers_down_when_reset_is_not_acknowledged() {
    let ispif = ispif();
    let sim = ispif.platform();
    ispif.init(2).unwrap();
    sim.registers().set_reset_response(false);

    assert_eq!(ispif.release(), Ok(()));
    assert!(!ispif.is_up());
    assert_eq!(sim.registers().writes_to(0x008), vec![0xFE0F_1FFF, 0xFE0F_1FFF]);
    assert!(sim.sim_clocks().enabled().is_empty());
    assert!(!sim.is_mapped());
    assert!(!sim.irq_installed());
}

#[test]
fn start_reports_reset_timeout() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    ispif.platform().registers().set_reset_response(false);
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi1, 0, &[0])]);
    assert_eq!(ispif.start_frame_boundary(&req), Err(IspifError::ResetTimeout));
    assert!(ispif.platform().registers().writes_to(INTF_CMD).is_empty());
}

#[test]
fn stop_gives_up_on_busy_lane() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi0, 0, &[2])]);
    ispif.configure(&req).unwrap();
    ispif.start_frame_boundary(&req).unwrap();

    ispif
        .platform()
        .registers()
        .hold_lane_busy(VfeInstance::Vfe0, InterfaceLane::Rdi0);
    assert_eq!(
        ispif.stop_frame_boundary(&req),
        Err(IspifError::Timeout(InterfaceLane::Rdi0))
    );
    assert_eq!(ispif.platform().registers().peek(RDI0_CID_MASK), 1 << 2);
}

#[test]
fn stop_waits_for_idle() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi2, 2, &[0, 4])]);
    ispif.configure(&req).unwrap();
    ispif.start_frame_boundary(&req).unwrap();

    ispif
        .platform()
        .registers()
        .busy_for_reads(VfeInstance::Vfe0, InterfaceLane::Rdi2, 3);
    ispif.stop_frame_boundary(&req).unwrap();
    assert_eq!(ispif.platform().registers().peek(RDI2_CID_MASK), 0);
}

#[test]
fn stop_immediately_does_not_wait_for_idle() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi0, 0, &[1, 6])]);
    ispif.configure(&req).unwrap();
    ispif.start_frame_boundary(&req).unwrap();

    let regs = ispif.platform().registers();
    regs.hold_lane_busy(VfeInstance::Vfe0, InterfaceLane::Rdi0);
    ispif.stop_immediately(&req).unwrap();
    assert_eq!(regs.peek(RDI0_CID_MASK), 0);
    assert_eq!(field(ispif.applied_command(VfeInstance::Vfe0).primary, 2), 0b10);
    assert_eq!(field(ispif.applied_command(VfeInstance::Vfe0).primary, 4), 0b10);
}

#[test]
fn open_close_counts_handles() {
    let ispif = ispif();
    assert_eq!(ispif.close(), Err(IspifError::NotOpen));

    ispif.open();
    ispif.open();
    ispif.init(2).unwrap();
    ispif.close().unwrap();
    assert!(ispif.is_up());
    assert_eq!(ispif.open_count(), 1);

    ispif.close().unwrap();
    assert!(!ispif.is_up());
    assert!(!ispif.platform().is_mapped());
    assert_eq!(ispif.close(), Err(IspifError::NotOpen));
}

#[test]
fn last_close_without_init_is_fine() {
    let ispif = ispif();
    ispif.open();
    assert_eq!(ispif.close(), Ok(()));
    assert_eq!(ispif.open_count(), 0);
}

#[test]
fn unknown_version_touches_nothing() {
    let ispif = ispif();
    assert_eq!(ispif.init(7), Err(IspifError::UnsupportedVersion(7)));
    assert!(ispif.platform().sim_clocks().enabled().is_empty());
    assert!(!ispif.platform().is_mapped());
}

#[test]
fn commands_require_power() {
    let ispif = ispif();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi0, 0, &[0])]);
    assert_eq!(ispif.configure(&req), Err(IspifError::NotUp));
    assert_eq!(ispif.start_frame_boundary(&req), Err(IspifError::NotUp));
    assert_eq!(ispif.stop_frame_boundary(&req), Err(IspifError::NotUp));
    assert_eq!(ispif.stop_immediately(&req), Err(IspifError::NotUp));
    assert_eq!(ispif.release(), Err(IspifError::NotUp));
    assert_eq!(ispif.register_dump(), Err(IspifError::NotUp));
    assert_eq!(ispif.handle(IspifCommand::Release), Ok(()));
}

#[test]
fn v3_routes_vfe1_through_input_select() {
    let ispif = ispif();
    ispif.init(3).unwrap();
    let sim = ispif.platform();
    assert_eq!(sim.sim_clocks().enabled().len(), 4);
    assert_eq!(sim.registers().writes_to(0x00C), vec![0xFC0F_1FF9]);

    sim.registers().poke(0x444, 0x0000_3000);
    let req = request(
        VfeInstance::Vfe1,
        &[(InterfaceLane::Rdi1, 2, &[1]), (InterfaceLane::Pix0, 3, &[0])],
    );
    ispif.configure(&req).unwrap();
    let input_sel = sim.registers().peek(0x444);
    assert_eq!((input_sel >> 12) & 0b11, 2);
    assert_eq!(input_sel & 0b11, 3);
    assert_eq!(sim.registers().peek(0x468), 1 << 1);
    assert_eq!(sim.registers().peek(0x408), 0x0A49_3249);

    ispif.start_frame_boundary(&req).unwrap();
    assert_eq!(sim.registers().writes_to(0x00C).last(), Some(&0x0000_0619));
    let primary = ispif.applied_command(VfeInstance::Vfe1).primary;
    assert_eq!(field(primary, 8), 0b01);
    assert_eq!(field(primary, 10), 0b01);
    assert_eq!(sim.registers().writes_to(0x448).last(), Some(&primary));
}

#[test]
fn v3_counts_vfe1_sof() {
    let ispif = ispif();
    ispif.init(3).unwrap();
    ispif
        .platform()
        .registers()
        .raise_sof(VfeInstance::Vfe1, InterfaceLane::Pix0);
    assert_eq!(ispif.sof_count(VfeInstance::Vfe1, InterfaceLane::Pix0), 1);
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Pix0), 0);
}

#[test]
fn v1_has_no_second_pixel_lane() {
    let ispif = ispif();
    ispif.init(1).unwrap();
    assert_eq!(
        ispif.platform().sim_clocks().enabled(),
        vec!["csi_pix_clk", "csi_rdi_clk"]
    );
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Pix1, 0, &[0])]);
    assert_eq!(ispif.configure(&req), Err(IspifError::InvalidInterface));
    assert_eq!(ispif.start_frame_boundary(&req), Err(IspifError::InvalidInterface));
}

#[test]
fn csid_out_of_range_rejected() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi0, 3, &[0])]);
    assert_eq!(ispif.configure(&req), Err(IspifError::InvalidInterface));
}

#[test]
fn configure_keeps_entries_before_a_failure() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    ispif
        .platform()
        .registers()
        .hold_lane_busy(VfeInstance::Vfe0, InterfaceLane::Rdi2);
    let req = request(
        VfeInstance::Vfe0,
        &[(InterfaceLane::Rdi0, 0, &[1]), (InterfaceLane::Rdi2, 0, &[2])],
    );
    assert_eq!(ispif.configure(&req), Err(IspifError::Busy(InterfaceLane::Rdi2)));
    assert_eq!(ispif.platform().registers().peek(RDI0_CID_MASK), 1 << 1);
    assert_eq!(ispif.platform().registers().peek(RDI2_CID_MASK), 0);
}

#[test]
fn malformed_request_rejected_without_writes() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    ispif.platform().registers().clear_writes();
    let dup = request(
        VfeInstance::Vfe0,
        &[(InterfaceLane::Rdi0, 0, &[1]), (InterfaceLane::Rdi0, 1, &[2])],
    );
    assert!(matches!(ispif.configure(&dup), Err(IspifError::InvalidRequest(_))));
    let empty = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi0, 0, &[])]);
    assert!(matches!(
        ispif.start_frame_boundary(&empty),
        Err(IspifError::InvalidRequest(_))
    ));
    assert!(ispif.platform().registers().writes().is_empty());
}

#[test]
fn rate_failure_is_not_fatal() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    ispif.platform().sim_clocks().fail_set_rate(true);
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Pix0, 2, &[0])]);
    ispif.configure(&req).unwrap();
    assert_eq!(ispif.platform().registers().peek(0x254), 1);
}

#[test]
fn acquisition_failures_unwind() {
    let ispif = ispif();
    ispif.platform().sim_clocks().fail_enable_of(Some("csi_rdi1_clk"));
    assert!(matches!(ispif.init(2), Err(IspifError::Clock(_))));
    assert!(ispif.platform().sim_clocks().enabled().is_empty());
    ispif.platform().sim_clocks().fail_enable_of(None);

    ispif.platform().fail_map(true);
    assert_eq!(ispif.init(2), Err(IspifError::Map));
    assert!(ispif.platform().sim_clocks().enabled().is_empty());
    ispif.platform().fail_map(false);

    ispif.platform().fail_irq(true);
    assert_eq!(ispif.init(2), Err(IspifError::Irq));
    assert!(!ispif.platform().is_mapped());
    assert!(ispif.platform().sim_clocks().enabled().is_empty());
    ispif.platform().fail_irq(false);

    ispif.init(2).unwrap();
}

#[test]
fn overflow_counted_not_fatal() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let regs = ispif.platform().registers();
    regs.raise_overflow(VfeInstance::Vfe0, InterfaceLane::Rdi0);
    regs.raise_overflow(VfeInstance::Vfe0, InterfaceLane::Rdi0);
    assert_eq!(ispif.overflow_count(VfeInstance::Vfe0, InterfaceLane::Rdi0), 2);
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Rdi0), 0);
}

#[test]
fn secondary_and_tertiary_banks_are_counted() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let regs = ispif.platform().registers();

    regs.raise_sof(VfeInstance::Vfe0, InterfaceLane::Rdi1);
    regs.raise_sof(VfeInstance::Vfe0, InterfaceLane::Rdi2);
    regs.raise_overflow(VfeInstance::Vfe0, InterfaceLane::Rdi2);

    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Rdi1), 1);
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Rdi2), 1);
    assert_eq!(ispif.overflow_count(VfeInstance::Vfe0, InterfaceLane::Rdi2), 1);
    assert_eq!(ispif.overflow_count(VfeInstance::Vfe0, InterfaceLane::Rdi1), 0);
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Pix0), 0);
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Rdi0), 0);
}

#[test]
fn rdi1_frames_counted_after_start() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi1, 1, &[0])]);
    ispif.configure(&req).unwrap();
    ispif.start_frame_boundary(&req).unwrap();

    let regs = ispif.platform().registers();
    regs.raise_sof(VfeInstance::Vfe0, InterfaceLane::Rdi1);
    regs.raise_sof(VfeInstance::Vfe0, InterfaceLane::Rdi1);
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Rdi1), 2);
}

#[test]
fn interface_reset_zeroes_only_named_lanes() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let regs = ispif.platform().registers();
    regs.raise_sof(VfeInstance::Vfe0, InterfaceLane::Pix0);
    regs.raise_sof(VfeInstance::Vfe0, InterfaceLane::Rdi0);

    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi0, 0, &[0])]);
    ispif.start_frame_boundary(&req).unwrap();
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Rdi0), 0);
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Pix0), 1);
    assert_eq!(regs.writes_to(0x008).last(), Some(&0x0000_0181));
}

#[test]
fn handle_dispatches_commands() {
    let ispif = ispif();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Rdi0, 1, &[2])]);

    ispif.handle(IspifCommand::SetDebugDump(true)).unwrap();
    assert!(ispif.debug_dump());
    ispif.handle(IspifCommand::Init(2)).unwrap();
    ispif.handle(IspifCommand::Configure(req.clone())).unwrap();
    ispif.handle(IspifCommand::StartFrameBoundary(req.clone())).unwrap();
    ispif.handle(IspifCommand::StopImmediately(req.clone())).unwrap();
    ispif.handle(IspifCommand::StopFrameBoundary(req)).unwrap();
    ispif.handle(IspifCommand::Release).unwrap();
    assert!(!ispif.is_up());
}

#[test]
fn register_dump_covers_window() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let dump = ispif.register_dump().unwrap();
    assert_eq!(dump.len(), 0x250 / 4);
    assert_eq!(dump.first().map(|&(o, _)| o), Some(0x100));
    assert_eq!(dump.last().map(|&(o, _)| o), Some(0x34C));
    assert!(dump.contains(&(0x2D0, 0xF)));
}

#[test]
fn config_document_sets_initial_dump_state() {
    let config = IspifConfig::from_toml_str("debug_dump = true\nreset_timeout_ms = 20\n").unwrap();
    let ispif = Ispif::new(SimPlatform::new(), config);
    assert!(ispif.debug_dump());
    assert_eq!(ispif.config().reset_timeout_ms, 20);
}

#[test]
fn interrupts_do_not_wait_for_commands() {
    let ispif = ispif();
    ispif.init(2).unwrap();
    let req = request(VfeInstance::Vfe0, &[(InterfaceLane::Pix0, 0, &[0])]);

    std::thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..200 {
                ispif
                    .platform()
                    .registers()
                    .raise_sof(VfeInstance::Vfe0, InterfaceLane::Rdi0);
            }
        });
        for _ in 0..50 {
            ispif.stop_immediately(&req).unwrap();
            ispif.register_dump().unwrap();
        }
    });
    assert_eq!(ispif.sof_count(VfeInstance::Vfe0, InterfaceLane::Rdi0), 200);
}
