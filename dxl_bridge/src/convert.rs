//! Raw register ↔ engineering unit conversion.
//!
//! The per-value arithmetic is model-specific and owned by the bus backend;
//! this module only fans it out across the slot range. Torque is reported
//! on the current scale: no model torque constant is applied, a known
//! approximation carried over unchanged.
//!
//! Vectorized calls require slot-ordered, length-N slices on both sides and
//! fail with `LengthMismatch` otherwise.

use crate::registry::ActuatorRegistry;
use dxl_common::bus::ServoBus;
use dxl_common::error::BridgeError;

/// Vectorized unit conversion over the registered actuators.
#[derive(Debug)]
pub struct UnitConverter {
    /// Bus IDs in slot order
    ids: Vec<u8>,
}

impl UnitConverter {
    /// Build a converter over the registry's slot order.
    pub fn new(registry: &ActuatorRegistry) -> Self {
        Self { ids: registry.ids() }
    }

    /// Number of slots the converter spans.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the converter spans no slots.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn check_len(&self, got: usize) -> Result<(), BridgeError> {
        if got != self.ids.len() {
            return Err(BridgeError::LengthMismatch {
                expected: self.ids.len(),
                got,
            });
        }
        Ok(())
    }

    /// Raw position ticks → radians for one actuator.
    pub fn raw_to_radian(&self, bus: &dyn ServoBus, id: u8, raw: i32) -> f64 {
        bus.value_to_radian(id, raw)
    }

    /// Radians → raw position ticks for one actuator.
    pub fn radian_to_raw(&self, bus: &dyn ServoBus, id: u8, radian: f64) -> i32 {
        bus.radian_to_value(id, radian)
    }

    /// Raw velocity ticks → rad/s for one actuator.
    pub fn raw_to_velocity(&self, bus: &dyn ServoBus, id: u8, raw: i32) -> f64 {
        bus.value_to_velocity(id, raw)
    }

    /// rad/s → raw velocity ticks for one actuator.
    pub fn velocity_to_raw(&self, bus: &dyn ServoBus, id: u8, velocity: f64) -> i32 {
        bus.velocity_to_value(id, velocity)
    }

    /// Raw current ticks → amperes for one actuator.
    pub fn raw_to_current(&self, bus: &dyn ServoBus, id: u8, raw: i32) -> f64 {
        bus.value_to_current(id, raw)
    }

    /// Raw position ticks → radians, slot-ordered.
    pub fn raw_to_radians(
        &self,
        bus: &dyn ServoBus,
        raw: &[i32],
        out: &mut [f64],
    ) -> Result<(), BridgeError> {
        self.check_len(raw.len())?;
        self.check_len(out.len())?;
        for (i, &id) in self.ids.iter().enumerate() {
            out[i] = bus.value_to_radian(id, raw[i]);
        }
        Ok(())
    }

    /// Radians → raw position ticks, slot-ordered.
    pub fn radians_to_raw(
        &self,
        bus: &dyn ServoBus,
        radians: &[f64],
        out: &mut [i32],
    ) -> Result<(), BridgeError> {
        self.check_len(radians.len())?;
        self.check_len(out.len())?;
        for (i, &id) in self.ids.iter().enumerate() {
            out[i] = bus.radian_to_value(id, radians[i]);
        }
        Ok(())
    }

    /// Raw velocity ticks → rad/s, slot-ordered.
    pub fn raw_to_velocities(
        &self,
        bus: &dyn ServoBus,
        raw: &[i32],
        out: &mut [f64],
    ) -> Result<(), BridgeError> {
        self.check_len(raw.len())?;
        self.check_len(out.len())?;
        for (i, &id) in self.ids.iter().enumerate() {
            out[i] = bus.value_to_velocity(id, raw[i]);
        }
        Ok(())
    }

    /// rad/s → raw velocity ticks, slot-ordered.
    pub fn velocities_to_raw(
        &self,
        bus: &dyn ServoBus,
        velocities: &[f64],
        out: &mut [i32],
    ) -> Result<(), BridgeError> {
        self.check_len(velocities.len())?;
        self.check_len(out.len())?;
        for (i, &id) in self.ids.iter().enumerate() {
            out[i] = bus.velocity_to_value(id, velocities[i]);
        }
        Ok(())
    }

    /// Raw current ticks → amperes, slot-ordered.
    pub fn raw_to_currents(
        &self,
        bus: &dyn ServoBus,
        raw: &[i32],
        out: &mut [f64],
    ) -> Result<(), BridgeError> {
        self.check_len(raw.len())?;
        self.check_len(out.len())?;
        for (i, &id) in self.ids.iter().enumerate() {
            out[i] = bus.value_to_current(id, raw[i]);
        }
        Ok(())
    }

    /// Raw current ticks → torque.
    ///
    /// Same conversion as [`raw_to_currents`](Self::raw_to_currents); only
    /// the label differs.
    pub fn raw_to_torques(
        &self,
        bus: &dyn ServoBus,
        raw: &[i32],
        out: &mut [f64],
    ) -> Result<(), BridgeError> {
        self.raw_to_currents(bus, raw, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus_backends::sim::SimBus;
    use crate::registry::ActuatorRecord;

    fn setup(ids: &[u8]) -> (ActuatorRegistry, SimBus) {
        let mut registry = ActuatorRegistry::new();
        for &id in ids {
            registry
                .register(ActuatorRecord {
                    id,
                    group: "default".to_string(),
                    settings: Vec::new(),
                })
                .unwrap();
        }
        (registry, SimBus::new())
    }

    #[test]
    fn test_position_round_trip_within_one_tick() {
        let (registry, bus) = setup(&[1, 2]);
        let converter = UnitConverter::new(&registry);

        let raw = vec![2048, 3000];
        let mut radians = vec![0.0; 2];
        let mut back = vec![0; 2];
        converter.raw_to_radians(&bus, &raw, &mut radians).unwrap();
        converter.radians_to_raw(&bus, &radians, &mut back).unwrap();

        for (a, b) in raw.iter().zip(back.iter()) {
            assert!((a - b).abs() <= 1, "raw {a} came back as {b}");
        }
    }

    #[test]
    fn test_radian_round_trip_within_quantization() {
        let (registry, bus) = setup(&[1]);
        let converter = UnitConverter::new(&registry);

        let theta = vec![0.75];
        let mut raw = vec![0];
        let mut back = vec![0.0];
        converter.radians_to_raw(&bus, &theta, &mut raw).unwrap();
        converter.raw_to_radians(&bus, &raw, &mut back).unwrap();

        // One tick of a 4096-count revolution.
        let step = std::f64::consts::TAU / 4096.0;
        assert!((theta[0] - back[0]).abs() <= step);
    }

    #[test]
    fn test_scalar_matches_vectorized() {
        let (registry, bus) = setup(&[1, 2]);
        let converter = UnitConverter::new(&registry);

        let raw = vec![1000, 3000];
        let mut out = vec![0.0; 2];
        converter.raw_to_radians(&bus, &raw, &mut out).unwrap();
        assert_eq!(converter.raw_to_radian(&bus, 1, 1000), out[0]);
        assert_eq!(converter.raw_to_radian(&bus, 2, 3000), out[1]);
        assert_eq!(
            converter.radian_to_raw(&bus, 1, out[0]),
            1000
        );
    }

    #[test]
    fn test_torque_is_current_alias() {
        let (registry, bus) = setup(&[1, 2, 3]);
        let converter = UnitConverter::new(&registry);

        let raw = vec![100, -250, 0];
        let mut current = vec![0.0; 3];
        let mut torque = vec![0.0; 3];
        converter.raw_to_currents(&bus, &raw, &mut current).unwrap();
        converter.raw_to_torques(&bus, &raw, &mut torque).unwrap();
        assert_eq!(current, torque);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let (registry, bus) = setup(&[1, 2]);
        let converter = UnitConverter::new(&registry);

        let raw = vec![0; 3];
        let mut out = vec![0.0; 2];
        let err = converter.raw_to_radians(&bus, &raw, &mut out).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::LengthMismatch { expected: 2, got: 3 }
        ));

        let raw = vec![0; 2];
        let mut out = vec![0.0; 1];
        assert!(converter.raw_to_radians(&bus, &raw, &mut out).is_err());
    }
}
