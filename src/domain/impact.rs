// Effects a grenade strike has on the ship it hits.

use crate::domain::state::{SimShip, Slide};

/// Strike parameters fixed at spawn. Defaults mirror rocket impacts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactSettings {
    pub damage: f32,
    /// Apply `damage` as-is instead of scaling by the target's shielding stat.
    pub deal_raw_damage: bool,

    pub engine_thrust_reduce: f32,
    pub engine_power_reduce: f32,
    pub engine_accel_reduce: f32,
    /// Fraction of the target's velocity removed.
    pub velocity_loss: f32,

    /// AI-only sideways slide.
    pub slide_force: f32,
    pub slide_time: f32,

    pub ignore_holding_shield: bool,
    pub ignore_shield: bool,
}

impl Default for ImpactSettings {
    fn default() -> Self {
        Self {
            damage: 12.0,
            deal_raw_damage: false,
            engine_thrust_reduce: 0.4,
            engine_power_reduce: 0.4,
            engine_accel_reduce: 0.4,
            velocity_loss: 0.3,
            slide_force: 15.0,
            slide_time: 1.5,
            ignore_holding_shield: false,
            ignore_shield: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImpactOutcome {
    /// A shield took the strike; the ship is untouched.
    Absorbed,
    Hit { damage: f32 },
}

impl ImpactOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, ImpactOutcome::Hit { .. })
    }
}

pub fn apply_impact(ship: &mut SimShip, settings: &ImpactSettings) -> ImpactOutcome {
    // Holding the shield pickup deploys it automatically on impact.
    if ship.holding_shield && !settings.ignore_holding_shield {
        ship.holding_shield = false;
        ship.shield_active = true;
        return ImpactOutcome::Absorbed;
    }
    if ship.shield_active && !settings.ignore_shield {
        return ImpactOutcome::Absorbed;
    }

    let damage = if settings.deal_raw_damage {
        settings.damage
    } else {
        settings.damage * ship.shielding
    };
    ship.hp = (ship.hp - damage).max(0.0);

    ship.engine.thrust *= 1.0 - settings.engine_thrust_reduce;
    ship.engine.power *= 1.0 - settings.engine_power_reduce;
    ship.engine.accel *= 1.0 - settings.engine_accel_reduce;
    ship.pose.velocity *= 1.0 - settings.velocity_loss;

    if !ship.is_player {
        ship.slide = Some(Slide {
            force: settings.slide_force,
            remaining: settings.slide_time,
        });
    }

    ImpactOutcome::Hit { damage }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::Pose;
    use glam::Vec3;

    fn ship() -> SimShip {
        let mut ship = SimShip::new(7, Pose::at(Vec3::ZERO));
        ship.pose.velocity = Vec3::new(0.0, 0.0, 100.0);
        ship
    }

    #[test]
    fn when_ship_is_unshielded_then_damage_and_penalties_apply() {
        let mut target = ship();
        target.shielding = 0.5;

        let outcome = apply_impact(&mut target, &ImpactSettings::default());

        assert_eq!(outcome, ImpactOutcome::Hit { damage: 6.0 });
        assert_eq!(target.hp, SimShip::MAX_HP - 6.0);
        assert!((target.engine.thrust - 0.6).abs() < 1e-6);
        assert!((target.engine.power - 0.6).abs() < 1e-6);
        assert!((target.engine.accel - 0.6).abs() < 1e-6);
        assert!((target.pose.velocity.z - 70.0).abs() < 1e-4);
        // Player ships never slide.
        assert!(target.slide.is_none());
    }

    #[test]
    fn when_raw_damage_then_shielding_is_ignored() {
        let mut target = ship();
        target.shielding = 0.25;
        let settings = ImpactSettings {
            deal_raw_damage: true,
            ..ImpactSettings::default()
        };

        assert_eq!(
            apply_impact(&mut target, &settings),
            ImpactOutcome::Hit { damage: 12.0 }
        );
    }

    #[test]
    fn when_target_is_ai_then_it_slides() {
        let mut target = ship();
        target.is_player = false;

        apply_impact(&mut target, &ImpactSettings::default());

        assert_eq!(
            target.slide,
            Some(Slide {
                force: 15.0,
                remaining: 1.5
            })
        );
    }

    #[test]
    fn when_shield_is_up_then_strike_is_absorbed() {
        let mut target = ship();
        target.shield_active = true;

        assert_eq!(
            apply_impact(&mut target, &ImpactSettings::default()),
            ImpactOutcome::Absorbed
        );
        assert_eq!(target.hp, SimShip::MAX_HP);

        let piercing = ImpactSettings {
            ignore_shield: true,
            ..ImpactSettings::default()
        };
        assert!(apply_impact(&mut target, &piercing).is_hit());
    }

    #[test]
    fn when_holding_shield_then_it_deploys_and_absorbs() {
        let mut target = ship();
        target.holding_shield = true;

        assert_eq!(
            apply_impact(&mut target, &ImpactSettings::default()),
            ImpactOutcome::Absorbed
        );
        assert!(target.shield_active);
        assert!(!target.holding_shield);
    }

    #[test]
    fn when_damage_exceeds_hp_then_hp_floors_at_zero() {
        let mut target = ship();
        target.hp = 5.0;
        apply_impact(&mut target, &ImpactSettings::default());
        assert_eq!(target.hp, 0.0);
    }
}
