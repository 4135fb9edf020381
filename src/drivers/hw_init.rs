//! One-shot hardware peripheral initialization and raw GPIO access.
//!
//! Configures GPIO directions and the per-pin ISR service using raw
//! ESP-IDF sys calls, and wraps single pins in small embedded-hal newtypes
//! so the drivers stay generic. Called once from `main()` before the
//! control loop starts.
//!
//! On host builds pin levels live in an in-memory table so the same code
//! paths run in simulation.

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrAddFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrAddFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_gpio_outputs()?;
        init_gpio_inputs()?;
        init_light_sensor()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let output_pins = [
        pins::MOTOR_IN1_GPIO,
        pins::MOTOR_IN2_GPIO,
        pins::MOTOR_IN3_GPIO,
        pins::MOTOR_IN4_GPIO,
        pins::LED_MANUAL_GPIO,
        pins::LED_TIMED_GPIO,
        pins::LED_AUTOMATIC_GPIO,
    ];

    for &pin in &output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: motor and indicator outputs configured");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    // Jog buttons pull the line HIGH while pressed.
    for &pin in &[pins::BUTTON_OPEN_GPIO, pins::BUTTON_CLOSE_GPIO] {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    // Mode and setup buttons: active-low, falling edge.
    for &pin in &[pins::BUTTON_MODE_GPIO, pins::BUTTON_SETUP_GPIO] {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: button inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_light_sensor() -> Result<(), HwInitError> {
    // Open-drain: writing 0 discharges the capacitor, writing 1 releases
    // the line so the LDR can charge it while the input stage reads it.
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::LIGHT_SENSOR_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    info!("hw_init: light sensor line configured (GPIO{})", pins::LIGHT_SENSOR_GPIO);
    Ok(())
}

// ── Raw level access ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> bool {
    // SAFETY: pin was configured as an output during init_peripherals().
    (unsafe { gpio_set_level(pin, u32::from(high)) }) == ESP_OK as i32
}

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicBool, Ordering};

    const SIM_PIN_COUNT: usize = 49;

    static SIM_LEVELS: [AtomicBool; SIM_PIN_COUNT] =
        [const { AtomicBool::new(false) }; SIM_PIN_COUNT];

    fn slot(pin: i32) -> Option<&'static AtomicBool> {
        usize::try_from(pin).ok().and_then(|i| SIM_LEVELS.get(i))
    }

    pub fn read(pin: i32) -> bool {
        slot(pin).is_some_and(|s| s.load(Ordering::Relaxed))
    }

    pub fn write(pin: i32, high: bool) -> bool {
        slot(pin).map(|s| s.store(high, Ordering::Relaxed)).is_some()
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    sim::read(pin)
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> bool {
    sim::write(pin, high)
}

/// Set a simulated input level (host builds only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(pin: i32, high: bool) {
    sim::write(pin, high);
}

// ── embedded-hal pin wrappers ─────────────────────────────────

/// Push-pull output pin.
#[derive(Debug)]
pub struct GpioOut(pub i32);

/// Input pin.
#[derive(Debug)]
pub struct GpioIn(pub i32);

/// Open-drain pin that is both driven and read (RC light sensor).
#[derive(Debug)]
pub struct GpioOpenDrain(pub i32);

fn write_level(pin: i32, high: bool) -> Result<(), ErrorKind> {
    if gpio_write(pin, high) { Ok(()) } else { Err(ErrorKind::Other) }
}

impl ErrorType for GpioOut {
    type Error = ErrorKind;
}

impl OutputPin for GpioOut {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        write_level(self.0, false)
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        write_level(self.0, true)
    }
}

impl ErrorType for GpioIn {
    type Error = ErrorKind;
}

impl InputPin for GpioIn {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.0))
    }
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.0))
    }
}

impl ErrorType for GpioOpenDrain {
    type Error = ErrorKind;
}

impl OutputPin for GpioOpenDrain {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        write_level(self.0, false)
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        write_level(self.0, true)
    }
}

impl InputPin for GpioOpenDrain {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.0))
    }
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.0))
    }
}

/// The four motor coil outputs, IN1..IN4.
pub fn motor_pins() -> [GpioOut; 4] {
    pins::MOTOR_GPIOS.map(GpioOut)
}

// ── Blocking delay ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub type SysDelay = esp_idf_hal::delay::Delay;

#[cfg(target_os = "espidf")]
pub fn sys_delay() -> SysDelay {
    esp_idf_hal::delay::Delay::new_default()
}

/// Thread-sleeping delay for simulation.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct SysDelay;

#[cfg(not(target_os = "espidf"))]
impl embedded_hal::delay::DelayNs for SysDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn sys_delay() -> SysDelay {
    SysDelay
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::button::{MODE_BUTTON, SETUP_BUTTON};
#[cfg(target_os = "espidf")]
use crate::events::EVENTS;

#[cfg(target_os = "espidf")]
fn isr_now_ms() -> u32 {
    // SAFETY: esp_timer_get_time is a counter read; safe in ISR context.
    (unsafe { esp_timer_get_time() } / 1_000) as u32
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn mode_button_isr(_arg: *mut core::ffi::c_void) {
    MODE_BUTTON.on_edge(isr_now_ms(), &EVENTS);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn setup_button_isr(_arg: *mut core::ffi::c_void) {
    SETUP_BUTTON.on_edge(isr_now_ms(), &EVENTS);
}

/// Install per-pin GPIO ISR service and register the button handlers.
/// Call after init_peripherals() and before the control loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means the service was already installed.
    // The handlers only touch atomics and the lock-free event queue.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let handlers: [(i32, unsafe extern "C" fn(*mut core::ffi::c_void)); 2] = [
            (pins::BUTTON_MODE_GPIO, mode_button_isr),
            (pins::BUTTON_SETUP_GPIO, setup_button_isr),
        ];
        for (pin, handler) in handlers {
            gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_NEGEDGE);
            let ret = gpio_isr_handler_add(pin, Some(handler), core::ptr::null_mut());
            if ret != ESP_OK as i32 {
                return Err(HwInitError::IsrAddFailed(ret));
            }
            gpio_intr_enable(pin);
        }

        info!("hw_init: ISR service installed (mode, setup)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

/// Drive every output low. Used on shutdown paths that no longer own the
/// driver structs.
pub fn release_outputs() {
    for pin in pins::MOTOR_GPIOS {
        gpio_write(pin, false);
    }
    for pin in [pins::LED_MANUAL_GPIO, pins::LED_TIMED_GPIO, pins::LED_AUTOMATIC_GPIO] {
        gpio_write(pin, false);
    }
}
