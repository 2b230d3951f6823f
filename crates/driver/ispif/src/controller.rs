//! The ISPIF controller and its command dispatcher.
//!
//! [`Ispif`] owns the device state behind one command lock. Every command
//! holds that lock for its full duration, including the blocking reset
//! waits. The interrupt path never takes it: the counters and the reset
//! completion it touches live in the separately shared [`IrqEvents`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;

use ispif_core::{InterfaceLane, ProtocolVersion, VfeInstance};
use ispif_mmio::RegisterPort;
use log::{debug, error, info, warn};

use crate::command::{AppliedCommand, FrameCommand};
use crate::config::IspifConfig;
use crate::error::IspifError;
use crate::irq::{InterruptReactor, IrqEvents};
use crate::layout::{CsidSelect, VersionProfile, lane_info};
use crate::platform::Platform;
use crate::regs::{
    DUMP_LEN, DUMP_START, IRQ_GLOBAL_CLEAR_CMD, IRQ_STATUS_0_MASK, IRQ_STATUS_1_MASK,
    IRQ_STATUS_2_MASK, IspifGlobalRegs, IspifVfeRegs, lane_is_idle, vfe_base,
};
use crate::request::RoutingRequest;
use crate::reset::ResetSequencer;

/// A command accepted by [`Ispif::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IspifCommand {
    /// Enable or disable the register dump after each command.
    SetDebugDump(bool),
    /// Power up with the given raw version code.
    Init(u32),
    /// Route lanes to CSID sources and enable their channels.
    Configure(RoutingRequest),
    /// Reset the named lanes and enable them at the next frame boundary.
    StartFrameBoundary(RoutingRequest),
    /// Disable the named lanes at the next frame boundary.
    StopFrameBoundary(RoutingRequest),
    /// Disable the named lanes without waiting for a frame boundary.
    StopImmediately(RoutingRequest),
    /// Power down.
    Release,
}

/// Resources held while powered up.
struct Powered {
    profile: &'static VersionProfile,
    port: Arc<dyn RegisterPort>,
}

struct DeviceState {
    powered: Option<Powered>,
    applied: [AppliedCommand; VfeInstance::COUNT],
    open_count: u32,
    debug_dump: bool,
}

impl DeviceState {
    fn powered(&self) -> Result<&Powered, IspifError> {
        self.powered.as_ref().ok_or(IspifError::NotUp)
    }
}

/// An ISPIF instance.
pub struct Ispif<P: Platform> {
    platform: P,
    config: IspifConfig,
    events: Arc<IrqEvents>,
    state: Mutex<DeviceState>,
}

impl<P: Platform> Ispif<P> {
    /// Creates a powered-down controller.
    #[must_use]
    pub fn new(platform: P, config: IspifConfig) -> Self {
        Self {
            platform,
            events: Arc::new(IrqEvents::new()),
            state: Mutex::new(DeviceState {
                powered: None,
                applied: [AppliedCommand::RESET; VfeInstance::COUNT],
                open_count: 0,
                debug_dump: config.debug_dump,
            }),
            config,
        }
    }

    /// Returns the platform the controller runs on.
    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Returns the tunables the controller was created with.
    #[must_use]
    pub fn config(&self) -> &IspifConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Command surface
    // -----------------------------------------------------------------------

    /// Executes one command.
    ///
    /// [`IspifCommand::Release`] never fails: errors are logged.
    ///
    /// # Errors
    ///
    /// Whatever the selected command returns.
    pub fn handle(&self, command: IspifCommand) -> Result<(), IspifError> {
        match command {
            IspifCommand::SetDebugDump(enable) => {
                self.set_debug_dump(enable);
                Ok(())
            }
            IspifCommand::Init(code) => self.init(code),
            IspifCommand::Configure(req) => self.configure(&req),
            IspifCommand::StartFrameBoundary(req) => self.start_frame_boundary(&req),
            IspifCommand::StopFrameBoundary(req) => self.stop_frame_boundary(&req),
            IspifCommand::StopImmediately(req) => self.stop_immediately(&req),
            IspifCommand::Release => {
                if let Err(err) = self.release() {
                    error!("ISPIF: release failed: {err}");
                }
                Ok(())
            }
        }
    }

    /// Enables or disables the register dump after each command.
    pub fn set_debug_dump(&self, enable: bool) {
        self.lock().debug_dump = enable;
    }

    /// Powers the device up.
    ///
    /// Enables the version's clocks, maps the registers, installs the
    /// interrupt reactor and performs a global reset. On failure every
    /// resource acquired so far is released again.
    ///
    /// # Errors
    ///
    /// [`IspifError::AlreadyUp`], [`IspifError::UnsupportedVersion`],
    /// [`IspifError::Clock`], [`IspifError::Map`], [`IspifError::Irq`] or
    /// [`IspifError::ResetTimeout`].
    pub fn init(&self, version_code: u32) -> Result<(), IspifError> {
        let mut state = self.lock();
        let result = self.init_locked(&mut state, version_code);
        self.dump_if_enabled(&state);
        result
    }

    /// Routes lanes of one VFE to their CSID sources and enables their
    /// channel masks.
    ///
    /// Entries are applied in order; entries applied before a failing one
    /// stay applied.
    ///
    /// # Errors
    ///
    /// [`IspifError::NotUp`], [`IspifError::InvalidRequest`],
    /// [`IspifError::InvalidInterface`] or [`IspifError::Busy`].
    pub fn configure(&self, request: &RoutingRequest) -> Result<(), IspifError> {
        let state = self.lock();
        let result = self.configure_locked(&state, request);
        self.dump_if_enabled(&state);
        result
    }

    /// Resets the named lanes and enables them at the next frame boundary.
    ///
    /// # Errors
    ///
    /// [`IspifError::NotUp`], [`IspifError::InvalidRequest`],
    /// [`IspifError::InvalidInterface`] or [`IspifError::ResetTimeout`].
    pub fn start_frame_boundary(&self, request: &RoutingRequest) -> Result<(), IspifError> {
        let mut state = self.lock();
        let result = self.start_locked(&mut state, request);
        self.dump_if_enabled(&state);
        result
    }

    /// Disables the named lanes at the next frame boundary, waits for each
    /// to go idle and clears its channel mask.
    ///
    /// # Errors
    ///
    /// [`IspifError::NotUp`], [`IspifError::InvalidRequest`],
    /// [`IspifError::InvalidInterface`] or [`IspifError::Timeout`].
    pub fn stop_frame_boundary(&self, request: &RoutingRequest) -> Result<(), IspifError> {
        let mut state = self.lock();
        let result = self.stop_locked(&mut state, request);
        self.dump_if_enabled(&state);
        result
    }

    /// Disables the named lanes immediately and clears their channel masks.
    ///
    /// # Errors
    ///
    /// [`IspifError::NotUp`], [`IspifError::InvalidRequest`] or
    /// [`IspifError::InvalidInterface`].
    pub fn stop_immediately(&self, request: &RoutingRequest) -> Result<(), IspifError> {
        let mut state = self.lock();
        let result = self.stop_immediately_locked(&mut state, request);
        self.dump_if_enabled(&state);
        result
    }

    /// Powers the device down.
    ///
    /// # Errors
    ///
    /// [`IspifError::NotUp`] if the device is not powered up.
    pub fn release(&self) -> Result<(), IspifError> {
        let mut state = self.lock();
        self.release_locked(&mut state)
    }

    /// Acquires a handle.
    pub fn open(&self) {
        let mut state = self.lock();
        state.open_count += 1;
        debug!("ISPIF: open, {} handle(s)", state.open_count);
    }

    /// Releases a handle. Releasing the last handle powers the device down.
    ///
    /// # Errors
    ///
    /// [`IspifError::NotOpen`] if no handle is held.
    pub fn close(&self) -> Result<(), IspifError> {
        let mut state = self.lock();
        state.open_count = state.open_count.checked_sub(1).ok_or(IspifError::NotOpen)?;
        debug!("ISPIF: close, {} handle(s)", state.open_count);
        if state.open_count == 0 {
            match self.release_locked(&mut state) {
                Ok(()) | Err(IspifError::NotUp) => {}
                Err(err) => error!("ISPIF: release on last close failed: {err}"),
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Returns `true` while powered up.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.lock().powered.is_some()
    }

    /// Returns the active protocol version, `None` while powered down.
    #[must_use]
    pub fn version(&self) -> Option<ProtocolVersion> {
        self.lock().powered.as_ref().map(|p| p.profile.version)
    }

    /// Returns the number of open handles.
    #[must_use]
    pub fn open_count(&self) -> u32 {
        self.lock().open_count
    }

    /// Returns whether the register dump is enabled.
    #[must_use]
    pub fn debug_dump(&self) -> bool {
        self.lock().debug_dump
    }

    /// Returns the command words last composed for `vfe`.
    #[must_use]
    pub fn applied_command(&self, vfe: VfeInstance) -> AppliedCommand {
        self.lock().applied[vfe.index()]
    }

    /// Returns the start-of-frame count of `lane` on `vfe`.
    #[must_use]
    pub fn sof_count(&self, vfe: VfeInstance, lane: InterfaceLane) -> u64 {
        self.events.sof(vfe, lane).get()
    }

    /// Returns the overflow count of `lane` on `vfe`.
    #[must_use]
    pub fn overflow_count(&self, vfe: VfeInstance, lane: InterfaceLane) -> u64 {
        self.events.overflow(vfe, lane).get()
    }

    /// Reads the diagnostic register window as `(offset, value)` pairs.
    ///
    /// # Errors
    ///
    /// [`IspifError::NotUp`] if the device is not powered up.
    pub fn register_dump(&self) -> Result<Vec<(u32, u32)>, IspifError> {
        let state = self.lock();
        Ok(read_window(&*state.powered()?.port))
    }

    // -----------------------------------------------------------------------
    // Protocol
    // -----------------------------------------------------------------------

    fn init_locked(&self, state: &mut DeviceState, code: u32) -> Result<(), IspifError> {
        if state.powered.is_some() {
            return Err(IspifError::AlreadyUp);
        }
        let version = ProtocolVersion::from_code(code).ok_or(IspifError::UnsupportedVersion(code))?;
        let profile = VersionProfile::get(version);
        let clocks = self.platform.clocks();

        clocks.enable(profile.clocks)?;

        let port = match self.platform.map_registers() {
            Ok(port) => port,
            Err(err) => {
                clocks.disable(profile.clocks);
                return Err(err);
            }
        };

        let reactor = InterruptReactor::new(Arc::clone(&port), profile.dual_vfe, Arc::clone(&self.events));
        if let Err(err) = self.platform.request_irq(Arc::new(reactor)) {
            self.platform.unmap_registers();
            clocks.disable(profile.clocks);
            return Err(err);
        }

        state.applied = [AppliedCommand::RESET; VfeInstance::COUNT];
        self.events.reset_counters();

        let reset = ResetSequencer::new(&*port, self.events.reset_done(), self.config.reset_timeout());
        if let Err(err) = reset.global(profile.dual_vfe) {
            error!("ISPIF: init reset failed");
            self.platform.free_irq();
            self.platform.unmap_registers();
            clocks.disable(profile.clocks);
            return Err(err);
        }

        state.powered = Some(Powered { profile, port });
        info!("ISPIF: powered up, csid {version}");
        Ok(())
    }

    fn configure_locked(&self, state: &DeviceState, request: &RoutingRequest) -> Result<(), IspifError> {
        let up = state.powered()?;
        request.validate()?;
        if !up.profile.supports_vfe(request.vfe) {
            error!("ISPIF: {} not present on csid {}", request.vfe, up.profile.version);
            return Err(IspifError::InvalidInterface);
        }

        let regs = IspifVfeRegs::new(&*up.port, vfe_base(request.vfe));
        regs.set_irq_mask_0(0);
        regs.set_irq_mask_1(0);
        regs.set_irq_mask_2_barrier(0);

        for entry in &request.entries {
            let lane = entry.lane;
            if !up.profile.supports_lane(lane) || !up.profile.supports_csid(entry.csid_source) {
                error!(
                    "ISPIF: {lane} from csid{} not routable on csid {}",
                    entry.csid_source, up.profile.version
                );
                return Err(IspifError::InvalidInterface);
            }
            if !lane_is_idle(regs.lane_status(lane)) {
                error!("ISPIF: {} {lane} busy", request.vfe);
                return Err(IspifError::Busy(lane));
            }
            self.select_csid(up, &regs, lane, entry.csid_source);
            regs.set_cid_mask_barrier(lane, regs.cid_mask(lane) | entry.channels.mask());
            debug!(
                "ISPIF: {} {lane} <- csid{} cids {:#x}",
                request.vfe,
                entry.csid_source,
                entry.channels.mask()
            );
        }

        regs.set_irq_mask_0(IRQ_STATUS_0_MASK);
        regs.set_irq_clear_0(IRQ_STATUS_0_MASK);
        regs.set_irq_mask_1(IRQ_STATUS_1_MASK);
        regs.set_irq_clear_1(IRQ_STATUS_1_MASK);
        regs.set_irq_mask_2(IRQ_STATUS_2_MASK);
        regs.set_irq_clear_2(IRQ_STATUS_2_MASK);
        IspifGlobalRegs::new(&*up.port, 0).set_irq_global_clear_barrier(IRQ_GLOBAL_CLEAR_CMD);
        Ok(())
    }

    fn select_csid(&self, up: &Powered, regs: &IspifVfeRegs<'_>, lane: InterfaceLane, csid: u8) {
        match up.profile.csid_select {
            CsidSelect::ClockRate => {
                let Some(clock) = up.profile.lane_clock(lane) else {
                    debug!("ISPIF: no rate clock for {lane}");
                    return;
                };
                if let Err(err) = self.platform.clocks().set_rate(clock, u64::from(csid)) {
                    error!("ISPIF: selecting csid{csid} for {lane}: {err}");
                }
            }
            CsidSelect::InputSelect => {
                let shift = lane_info(lane).input_sel_shift;
                let value = (regs.input_sel() & !(0b11 << shift)) | (u32::from(csid) << shift);
                regs.set_input_sel_barrier(value);
            }
        }
    }

    fn start_locked(&self, state: &mut DeviceState, request: &RoutingRequest) -> Result<(), IspifError> {
        let DeviceState { powered, applied, .. } = state;
        let up = powered.as_ref().ok_or(IspifError::NotUp)?;
        check_request(up.profile, request)?;

        for lane in request.lanes() {
            self.events.sof(request.vfe, lane).reset();
        }
        ResetSequencer::new(&*up.port, self.events.reset_done(), self.config.reset_timeout())
            .lanes(request.vfe, request.lanes())?;

        let regs = IspifVfeRegs::new(&*up.port, vfe_base(request.vfe));
        let applied = &mut applied[request.vfe.index()];
        applied.apply(request, FrameCommand::EnableAtBoundary);
        applied.write(&regs);
        Ok(())
    }

    fn stop_locked(&self, state: &mut DeviceState, request: &RoutingRequest) -> Result<(), IspifError> {
        let DeviceState { powered, applied, .. } = state;
        let up = powered.as_ref().ok_or(IspifError::NotUp)?;
        check_request(up.profile, request)?;

        let regs = IspifVfeRegs::new(&*up.port, vfe_base(request.vfe));
        let applied = &mut applied[request.vfe.index()];
        applied.apply(request, FrameCommand::DisableAtBoundary);
        applied.write(&regs);

        for entry in &request.entries {
            self.wait_idle(&regs, entry.lane)?;
            regs.set_cid_mask_barrier(entry.lane, regs.cid_mask(entry.lane) & !entry.channels.mask());
        }
        Ok(())
    }

    fn stop_immediately_locked(
        &self,
        state: &mut DeviceState,
        request: &RoutingRequest,
    ) -> Result<(), IspifError> {
        let DeviceState { powered, applied, .. } = state;
        let up = powered.as_ref().ok_or(IspifError::NotUp)?;
        check_request(up.profile, request)?;

        let regs = IspifVfeRegs::new(&*up.port, vfe_base(request.vfe));
        let applied = &mut applied[request.vfe.index()];
        applied.apply(request, FrameCommand::DisableImmediately);
        applied.write(&regs);

        for entry in &request.entries {
            regs.set_cid_mask_barrier(entry.lane, regs.cid_mask(entry.lane) & !entry.channels.mask());
        }
        Ok(())
    }

    /// Polls the lane status until idle, sleeping with exponential backoff.
    fn wait_idle(&self, regs: &IspifVfeRegs<'_>, lane: InterfaceLane) -> Result<(), IspifError> {
        let poll = self.config.idle_poll;
        let deadline = Instant::now() + poll.timeout();
        let mut backoff = poll.initial_backoff();
        loop {
            if lane_is_idle(regs.lane_status(lane)) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                error!("ISPIF: {lane} not idle after {:?}", poll.timeout());
                return Err(IspifError::Timeout(lane));
            }
            thread::sleep(backoff);
            backoff = (backoff * 2).min(poll.max_backoff());
        }
    }

    fn release_locked(&self, state: &mut DeviceState) -> Result<(), IspifError> {
        let up = state.powered.take().ok_or(IspifError::NotUp)?;

        let reset = ResetSequencer::new(&*up.port, self.events.reset_done(), self.config.reset_timeout());
        if let Err(err) = reset.global(up.profile.dual_vfe) {
            warn!("ISPIF: release reset: {err}");
        }

        self.platform.free_irq();
        self.platform.unmap_registers();
        self.platform.clocks().disable(up.profile.clocks);
        info!("ISPIF: powered down");
        Ok(())
    }

    fn dump_if_enabled(&self, state: &DeviceState) {
        if !state.debug_dump || !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let Some(up) = state.powered.as_ref() else {
            return;
        };
        for row in read_window(&*up.port).chunks(4) {
            let words: Vec<String> = row.iter().map(|(_, v)| format!("{v:08x}")).collect();
            debug!("ISPIF: {:#05x}: {}", row[0].0, words.join(" "));
        }
    }
}

impl<P: Platform> core::fmt::Debug for Ispif<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.lock();
        f.debug_struct("Ispif")
            .field("version", &state.powered.as_ref().map(|p| p.profile.version))
            .field("open_count", &state.open_count)
            .field("debug_dump", &state.debug_dump)
            .finish_non_exhaustive()
    }
}

/// Validates a frame-boundary request against the active version.
fn check_request(profile: &VersionProfile, request: &RoutingRequest) -> Result<(), IspifError> {
    request.validate()?;
    if !profile.supports_vfe(request.vfe) || !request.lanes().all(|lane| profile.supports_lane(lane)) {
        error!("ISPIF: request for {} invalid on csid {}", request.vfe, profile.version);
        return Err(IspifError::InvalidInterface);
    }
    Ok(())
}

fn read_window(port: &dyn RegisterPort) -> Vec<(u32, u32)> {
    (DUMP_START..DUMP_START + DUMP_LEN)
        .step_by(4)
        .map(|offset| (offset, port.read32(offset)))
        .collect()
}
