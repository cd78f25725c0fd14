use bevy_egui::egui::{self, Align2, Color32, FontId, RichText};

use super::data_slot::{DataSlot, StatOption};
use crate::content::StatKind;
use crate::hazard::{HazardManager, HazardStage, HazardView, ResultBanner};
use crate::player::Player;
use crate::world::Tile;

const EMPOWERED_GLOW: Color32 = Color32::from_rgb(240, 140, 60);

/// Queue, stat and discard trays. Clicks go straight to the view, which
/// checks them against the manager.
pub fn show_hazard_trays(
    ctx: &mut egui::Context,
    manager: &mut HazardManager,
    view: &mut HazardView,
    player: Option<&Player>,
    tile: Option<&Tile>,
) {
    if !view.shown {
        return;
    }
    let mut open = true;
    egui::Window::new("Hazards")
        .anchor(Align2::CENTER_BOTTOM, egui::vec2(0.0, -12.0))
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            ui.label(match view.stage {
                HazardStage::Idle => "Upcoming hazards",
                HazardStage::AwaitingCard => "A hazard approaches! Choose a card to face.",
                HazardStage::AwaitingStat => "Choose how to respond.",
                HazardStage::Resolving => "Rolling...",
            });
            ui.separator();

            let active_id = manager.active_card().map(|c| c.id);
            let mut clicked_card = None;
            ui.horizontal(|ui| {
                for dealt in manager.queue() {
                    let empowered = tile.is_some_and(|t| dealt.card.is_empowered_on(t));
                    let selectable = match view.stage {
                        HazardStage::AwaitingCard => true,
                        HazardStage::AwaitingStat => active_id == Some(dealt.id),
                        _ => false,
                    };
                    let response = ui.add(
                        DataSlot::new(dealt)
                            .selectable(selectable)
                            .selected(active_id == Some(dealt.id))
                            .glow(empowered.then_some(EMPOWERED_GLOW)),
                    );
                    if response.clicked() {
                        clicked_card = Some(dealt.id);
                    }
                }
            });
            if let Some(id) = clicked_card {
                view.click_card(manager, id);
            }

            if view.stage == HazardStage::AwaitingStat {
                if let (Some(active), Some(player)) = (manager.active_card(), player) {
                    ui.separator();
                    let mut clicked_stat = None;
                    ui.horizontal(|ui| {
                        for stat in StatKind::ALL {
                            let eligible = active.card.eligible_stats.contains(&stat);
                            let option = StatOption {
                                stat,
                                value: player.stat(stat),
                            };
                            let response = ui.add_enabled(
                                eligible,
                                DataSlot::new(&option).selectable(eligible).min_width(90.0),
                            );
                            if response.clicked() {
                                clicked_stat = Some(stat);
                            }
                        }
                    });
                    if let Some(stat) = clicked_stat {
                        view.click_stat(manager, stat);
                    }
                }
            }

            ui.separator();
            ui.label(format!("Draw pile: {}", manager.draw_pile_len()));
            egui::CollapsingHeader::new(format!("Discard pile ({})", manager.discard_pile().len()))
                .id_source("hazard_discard")
                .show(ui, |ui| {
                    for dealt in manager.discard_pile().iter().rev() {
                        ui.label(RichText::new(&dealt.card.name).color(Color32::GRAY));
                    }
                });
        });
    if !open && !view.is_event_active() {
        view.shown = false;
    }
}

pub fn show_result_banner(ctx: &mut egui::Context, banner: &ResultBanner) {
    let check = &banner.resolution.check;
    let (title, color) = if check.success {
        ("Survived!", Color32::from_rgb(120, 220, 120))
    } else {
        ("Casualties!", Color32::from_rgb(235, 90, 80))
    };
    let fade = 1.0 - banner.timer.fraction();
    let alpha = (fade.clamp(0.0, 1.0) * 255.0) as u8;
    let color = Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha);
    egui::Area::new("hazard_result".into())
        .anchor(Align2::CENTER_TOP, egui::vec2(0.0, 80.0))
        .interactable(false)
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(title).font(FontId::proportional(40.0)).color(color));
                ui.label(RichText::new(&banner.resolution.card.card.name).size(20.0));
                let mut detail = format!(
                    "{} {} + roll {} vs {}",
                    check.stat.display_name(),
                    check.stat_value,
                    check.roll,
                    check.difficulty
                );
                if check.empowered {
                    detail.push_str(" (empowered)");
                }
                ui.label(detail);
            });
        });
}
