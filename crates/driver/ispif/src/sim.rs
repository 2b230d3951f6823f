//! Host simulation of the ISPIF hardware.
//!
//! [`SimPlatform`] bundles a simulated register file, a clock port and the
//! interrupt line, so the controller can be driven end to end without
//! hardware. The interrupt is delivered synchronously: a reset write, or an
//! explicit [`SimRegisters::raise`], latches status bits and then calls the
//! installed [`InterruptReactor`] on the writing thread, after the register
//! file lock has been dropped.
//!
//! Status registers are write-one-to-clear through their clear registers.
//! Lane status registers read idle (`0xF`) unless a lane is marked busy.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ispif_core::{InterfaceLane, VfeInstance};
use ispif_mmio::RegisterPort;

use crate::error::{ClockError, IspifError};
use crate::irq::{InterruptReactor, IrqSnapshot};
use crate::layout::{IrqSource, lane_info};
use crate::platform::{ClockPort, Platform};
use crate::regs::{IrqStatus0, IspifGlobalRegs, IspifVfeRegs, LANE_IDLE_MASK, vfe_base};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Register file
// ---------------------------------------------------------------------------

/// One recorded register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegWrite {
    /// Byte offset within the window.
    pub offset: u32,
    /// Value written.
    pub value: u32,
    /// Whether the write was a barrier write.
    pub barrier: bool,
}

#[derive(Debug, Clone, Copy)]
enum Busy {
    /// Busy for this many more status reads.
    Reads(u32),
    /// Busy until released.
    Held,
}

#[derive(Debug, Default)]
struct RegFile {
    values: BTreeMap<u32, u32>,
    writes: Vec<RegWrite>,
    busy: BTreeMap<u32, Busy>,
    ignore_resets: bool,
}

/// A simulated ISPIF register window.
#[derive(Debug)]
pub struct SimRegisters {
    file: Mutex<RegFile>,
    reactor: Mutex<Option<Arc<InterruptReactor>>>,
}

impl SimRegisters {
    /// Creates a register file with every lane idle and resets acknowledged.
    #[must_use]
    pub fn new() -> Self {
        let sim = Self {
            file: Mutex::new(RegFile::default()),
            reactor: Mutex::new(None),
        };
        for vfe in VfeInstance::ALL {
            for lane in InterfaceLane::ALL {
                let offset = sim.vfe(vfe).lane_status_offset(lane);
                lock(&sim.file).values.insert(offset, LANE_IDLE_MASK);
            }
        }
        sim
    }

    fn vfe(&self, vfe: VfeInstance) -> IspifVfeRegs<'_> {
        IspifVfeRegs::new(self, vfe_base(vfe))
    }

    fn global(&self) -> IspifGlobalRegs<'_> {
        IspifGlobalRegs::new(self, 0)
    }

    /// Returns the current value at `offset` without side effects.
    #[must_use]
    pub fn peek(&self, offset: u32) -> u32 {
        lock(&self.file).values.get(&offset).copied().unwrap_or(0)
    }

    /// Sets the value at `offset` without recording a write.
    pub fn poke(&self, offset: u32, value: u32) {
        lock(&self.file).values.insert(offset, value);
    }

    /// Returns every write recorded so far.
    #[must_use]
    pub fn writes(&self) -> Vec<RegWrite> {
        lock(&self.file).writes.clone()
    }

    /// Returns the values written to `offset`, in order.
    #[must_use]
    pub fn writes_to(&self, offset: u32) -> Vec<u32> {
        lock(&self.file)
            .writes
            .iter()
            .filter(|w| w.offset == offset)
            .map(|w| w.value)
            .collect()
    }

    /// Forgets the recorded writes.
    pub fn clear_writes(&self) {
        lock(&self.file).writes.clear();
    }

    /// Makes the hardware stop acknowledging resets.
    pub fn set_reset_response(&self, acknowledge: bool) {
        lock(&self.file).ignore_resets = !acknowledge;
    }

    /// Keeps `lane` of `vfe` busy until [`release_lane`](Self::release_lane).
    pub fn hold_lane_busy(&self, vfe: VfeInstance, lane: InterfaceLane) {
        let offset = self.vfe(vfe).lane_status_offset(lane);
        lock(&self.file).busy.insert(offset, Busy::Held);
    }

    /// Makes `lane` of `vfe` read busy for the next `reads` status reads.
    pub fn busy_for_reads(&self, vfe: VfeInstance, lane: InterfaceLane, reads: u32) {
        let offset = self.vfe(vfe).lane_status_offset(lane);
        lock(&self.file).busy.insert(offset, Busy::Reads(reads));
    }

    /// Lets `lane` of `vfe` read idle again.
    pub fn release_lane(&self, vfe: VfeInstance, lane: InterfaceLane) {
        let offset = self.vfe(vfe).lane_status_offset(lane);
        lock(&self.file).busy.remove(&offset);
    }

    /// Returns `true` while an interrupt handler is installed.
    #[must_use]
    pub fn irq_attached(&self) -> bool {
        lock(&self.reactor).is_some()
    }

    fn attach(&self, reactor: Arc<InterruptReactor>) {
        *lock(&self.reactor) = Some(reactor);
    }

    fn detach(&self) {
        *lock(&self.reactor) = None;
    }

    /// Latches `status` into the status banks of `vfe` and delivers an
    /// interrupt.
    ///
    /// Returns the reactor's snapshot, or `None` when no handler is
    /// installed (the bits stay latched).
    pub fn raise(&self, vfe: VfeInstance, status: [u32; 3]) -> Option<IrqSnapshot> {
        let regs = self.vfe(vfe);
        let offsets = [
            regs.irq_status_0_offset(),
            regs.irq_status_1_offset(),
            regs.irq_status_2_offset(),
        ];
        {
            let mut file = lock(&self.file);
            for (offset, bits) in offsets.into_iter().zip(status) {
                *file.values.entry(offset).or_insert(0) |= bits;
            }
        }
        self.deliver()
    }

    /// Raises the start-of-frame interrupt of `lane`.
    ///
    /// PIX1 reports no start of frame; nothing is latched for it.
    pub fn raise_sof(&self, vfe: VfeInstance, lane: InterfaceLane) -> Option<IrqSnapshot> {
        self.raise_source(vfe, lane_info(lane).sof?)
    }

    /// Raises the overflow interrupt of `lane`.
    pub fn raise_overflow(&self, vfe: VfeInstance, lane: InterfaceLane) -> Option<IrqSnapshot> {
        self.raise_source(vfe, lane_info(lane).overflow?)
    }

    /// Bank 1 and 2 sources are only serviced alongside a bank 0 bit. They
    /// are paired with `RESET_DONE`, the bank 0 source that moves no counter.
    fn raise_source(&self, vfe: VfeInstance, src: IrqSource) -> Option<IrqSnapshot> {
        let mut status = [0; 3];
        status[src.bank()] = src.bits();
        if src.bank() != 0 {
            status[0] |= IrqStatus0::RESET_DONE.bits();
        }
        self.raise(vfe, status)
    }

    fn deliver(&self) -> Option<IrqSnapshot> {
        let reactor = lock(&self.reactor).clone()?;
        Some(reactor.handle_irq())
    }

    /// Applies the side effects of a write. Returns `true` when the write
    /// raises an interrupt.
    fn store(&self, offset: u32, value: u32, barrier: bool) -> bool {
        let global = self.global();
        let mut file = lock(&self.file);
        file.writes.push(RegWrite {
            offset,
            value,
            barrier,
        });
        file.values.insert(offset, value);

        if offset == global.rst_cmd_offset() || offset == global.rst_cmd_1_offset() {
            if file.ignore_resets {
                return false;
            }
            let status0 = self.vfe(VfeInstance::Vfe0).irq_status_0_offset();
            *file.values.entry(status0).or_insert(0) |= IrqStatus0::RESET_DONE.bits();
            return true;
        }

        for vfe in VfeInstance::ALL {
            let regs = self.vfe(vfe);
            let pairs = [
                (regs.irq_clear_0_offset(), regs.irq_status_0_offset()),
                (regs.irq_clear_1_offset(), regs.irq_status_1_offset()),
                (regs.irq_clear_2_offset(), regs.irq_status_2_offset()),
            ];
            for (clear, status) in pairs {
                if offset == clear {
                    if let Some(bits) = file.values.get_mut(&status) {
                        *bits &= !value;
                    }
                }
            }
        }
        false
    }
}

impl Default for SimRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterPort for SimRegisters {
    fn read32(&self, offset: u32) -> u32 {
        let mut file = lock(&self.file);
        match file.busy.get(&offset).copied() {
            Some(Busy::Held) => return 0,
            Some(Busy::Reads(0)) | None => {}
            Some(Busy::Reads(n)) => {
                file.busy.insert(offset, Busy::Reads(n - 1));
                return 0;
            }
        }
        file.values.get(&offset).copied().unwrap_or(0)
    }

    fn write32(&self, offset: u32, value: u32) {
        if self.store(offset, value, false) {
            self.deliver();
        }
    }

    fn write32_barrier(&self, offset: u32, value: u32) {
        if self.store(offset, value, true) {
            self.deliver();
        }
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ClockState {
    enabled: BTreeSet<&'static str>,
    rates: BTreeMap<&'static str, u64>,
    fail_enable: Option<&'static str>,
    fail_set_rate: bool,
}

/// A simulated clock controller.
#[derive(Debug, Default)]
pub struct SimClocks {
    state: Mutex<ClockState>,
}

impl SimClocks {
    /// Returns the enabled clocks in name order.
    #[must_use]
    pub fn enabled(&self) -> Vec<&'static str> {
        lock(&self.state).enabled.iter().copied().collect()
    }

    /// Returns the last rate set on `name`.
    #[must_use]
    pub fn rate(&self, name: &str) -> Option<u64> {
        lock(&self.state).rates.get(name).copied()
    }

    /// Makes enabling `name` fail; `None` lets every enable succeed.
    pub fn fail_enable_of(&self, name: Option<&'static str>) {
        lock(&self.state).fail_enable = name;
    }

    /// Makes every rate change fail.
    pub fn fail_set_rate(&self, fail: bool) {
        lock(&self.state).fail_set_rate = fail;
    }
}

impl ClockPort for SimClocks {
    fn enable(&self, names: &[&'static str]) -> Result<(), ClockError> {
        let mut state = lock(&self.state);
        for (i, &name) in names.iter().enumerate() {
            if state.fail_enable == Some(name) {
                for done in &names[..i] {
                    state.enabled.remove(done);
                }
                return Err(ClockError { clock: name });
            }
            state.enabled.insert(name);
        }
        Ok(())
    }

    fn disable(&self, names: &[&'static str]) {
        let mut state = lock(&self.state);
        for name in names {
            state.enabled.remove(name);
        }
    }

    fn set_rate(&self, name: &'static str, rate: u64) -> Result<(), ClockError> {
        let mut state = lock(&self.state);
        if state.fail_set_rate {
            return Err(ClockError { clock: name });
        }
        state.rates.insert(name, rate);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Resources {
    mapped: bool,
    fail_map: bool,
    fail_irq: bool,
}

/// A simulated host platform.
#[derive(Debug, Default)]
pub struct SimPlatform {
    regs: Arc<SimRegisters>,
    clocks: SimClocks,
    resources: Mutex<Resources>,
}

impl SimPlatform {
    /// Creates a platform with idle hardware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the simulated register file.
    #[must_use]
    pub fn registers(&self) -> &Arc<SimRegisters> {
        &self.regs
    }

    /// Returns the simulated clock controller.
    #[must_use]
    pub fn sim_clocks(&self) -> &SimClocks {
        &self.clocks
    }

    /// Returns `true` while the register window is mapped.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        lock(&self.resources).mapped
    }

    /// Returns `true` while an interrupt handler is installed.
    #[must_use]
    pub fn irq_installed(&self) -> bool {
        self.regs.irq_attached()
    }

    /// Makes mapping the register window fail.
    pub fn fail_map(&self, fail: bool) {
        lock(&self.resources).fail_map = fail;
    }

    /// Makes installing the interrupt handler fail.
    pub fn fail_irq(&self, fail: bool) {
        lock(&self.resources).fail_irq = fail;
    }
}

impl Platform for SimPlatform {
    fn clocks(&self) -> &dyn ClockPort {
        &self.clocks
    }

    fn map_registers(&self) -> Result<Arc<dyn RegisterPort>, IspifError> {
        let mut res = lock(&self.resources);
        if res.fail_map {
            return Err(IspifError::Map);
        }
        res.mapped = true;
        Ok(self.regs.clone())
    }

    fn unmap_registers(&self) {
        lock(&self.resources).mapped = false;
    }

    fn request_irq(&self, reactor: Arc<InterruptReactor>) -> Result<(), IspifError> {
        if lock(&self.resources).fail_irq {
            return Err(IspifError::Irq);
        }
        self.regs.attach(reactor);
        Ok(())
    }

    fn free_irq(&self) {
        self.regs.detach();
    }
}
