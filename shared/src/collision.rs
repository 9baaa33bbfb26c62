use crate::npc::{Npc, VehicleKind};

/// Axis-aligned contact box around the player, in lane and offset units.
#[derive(Debug, Clone, Copy)]
pub struct ContactBox {
	pub half_width: f32,
	pub half_length: f32,
}

impl ContactBox {
	pub fn touches(&self, player_lane: f32, npc: &Npc) -> bool {
		let dx = (npc.lane - player_lane).abs();
		let dz = npc.offset.abs();
		dx < self.half_width && dz < self.half_length
	}
}

/// First active car touching the player, in grid order.
pub fn first_contact<'a>(
	contact: ContactBox,
	player_lane: f32,
	npcs: impl IntoIterator<Item = &'a Npc>,
) -> Option<(VehicleKind, &'a Npc)> {
	npcs.into_iter()
		.filter(|npc| npc.is_active())
		.find(|npc| contact.touches(player_lane, npc))
		.map(|npc| (npc.kind(), npc))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::npc::{Behavior, NpcSpec, PoliceState};

	const BOX: ContactBox = ContactBox { half_width: 2.0, half_length: 4.5 };

	fn rival(lane: f32, offset: f32) -> Npc {
		Npc::from_spec(&NpcSpec::rival("r", "R", 280.0, lane, offset))
	}

	#[test]
	fn adjacent_lane_at_zero_offset_collides() {
		assert!(BOX.touches(0.0, &rival(1.0, 0.0)));
	}

	#[test]
	fn distant_lane_misses() {
		assert!(!BOX.touches(0.0, &rival(5.0, 0.0)));
	}

	#[test]
	fn box_edges_are_exclusive() {
		assert!(!BOX.touches(0.0, &rival(2.0, 0.0)));
		assert!(!BOX.touches(0.0, &rival(0.0, 4.5)));
		assert!(!BOX.touches(0.0, &rival(0.0, -4.5)));
		assert!(BOX.touches(0.0, &rival(0.0, -4.4)));
	}

	#[test]
	fn parked_police_is_ignored() {
		let parked = Npc::from_spec(&NpcSpec::police("p", "UNIT", 330.0, 0.0, 0.0));
		assert!(first_contact(BOX, 0.0, [&parked]).is_none());

		let mut active = parked.clone();
		active.behavior = Behavior::Police { state: PoliceState::Active };
		let (kind, _) = first_contact(BOX, 0.0, [&active]).expect("active unit in the box");
		assert_eq!(kind, VehicleKind::Police);
	}

	#[test]
	fn reports_first_in_grid_order() {
		let mut police = Npc::from_spec(&NpcSpec::police("p", "UNIT", 330.0, 0.0, 1.0));
		police.behavior = Behavior::Police { state: PoliceState::Active };
		let cars = vec![rival(9.0, 0.0), police, rival(0.5, 0.0)];
		let (kind, npc) = first_contact(BOX, 0.0, &cars).expect("two cars in the box");
		assert_eq!(kind, VehicleKind::Police);
		assert_eq!(npc.id, "p");
	}
}
