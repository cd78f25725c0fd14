use bevy_egui::egui::{self, Color32, RichText, Sense, Stroke};

use crate::content::{HazardType, MigrationEventDef, StatKind};
use crate::hazard::DealtCard;
use crate::player::Player;

/// One styled run of text inside a slot line.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotFragment {
    pub text: String,
    pub color: Option<Color32>,
    pub strong: bool,
    pub size: Option<f32>,
}

impl SlotFragment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            strong: false,
            size: None,
        }
    }

    pub fn strong(mut self) -> Self {
        self.strong = true;
        self
    }

    pub fn color(mut self, color: Color32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    fn rich(&self) -> RichText {
        let mut text = RichText::new(&self.text);
        if let Some(color) = self.color {
            text = text.color(color);
        }
        if self.strong {
            text = text.strong();
        }
        if let Some(size) = self.size {
            text = text.size(size);
        }
        text
    }
}

pub type SlotLine = Vec<SlotFragment>;

/// Anything that can describe itself as a few lines of styled text.
pub trait SlotContent {
    fn slot_lines(&self) -> Vec<SlotLine>;
}

/// Generic framed text block. Knows nothing about what it displays.
pub struct DataSlot<'a, T: SlotContent + ?Sized> {
    content: &'a T,
    selectable: bool,
    selected: bool,
    glow: Option<Color32>,
    min_width: f32,
}

impl<'a, T: SlotContent + ?Sized> DataSlot<'a, T> {
    pub fn new(content: &'a T) -> Self {
        Self {
            content,
            selectable: false,
            selected: false,
            glow: None,
            min_width: 140.0,
        }
    }

    pub fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn glow(mut self, glow: Option<Color32>) -> Self {
        self.glow = glow;
        self
    }

    pub fn min_width(mut self, width: f32) -> Self {
        self.min_width = width;
        self
    }
}

impl<T: SlotContent + ?Sized> egui::Widget for DataSlot<'_, T> {
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let stroke = match (self.selected, self.glow) {
            (true, _) => Stroke::new(2.5, Color32::from_rgb(250, 230, 120)),
            (false, Some(glow)) => Stroke::new(2.0, glow),
            (false, None) => Stroke::new(1.0, Color32::from_gray(90)),
        };
        let fill = if self.selected {
            Color32::from_rgb(60, 55, 30)
        } else {
            Color32::from_gray(32)
        };
        let inner = egui::Frame::none()
            .fill(fill)
            .stroke(stroke)
            .rounding(6.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.set_min_width(self.min_width);
                ui.vertical(|ui| {
                    for line in self.content.slot_lines() {
                        ui.horizontal_wrapped(|ui| {
                            ui.spacing_mut().item_spacing.x = 4.0;
                            for fragment in &line {
                                ui.label(fragment.rich());
                            }
                        });
                    }
                });
            });
        let sense = if self.selectable {
            Sense::click()
        } else {
            Sense::hover()
        };
        let response = ui.interact(inner.response.rect, inner.response.id.with("slot"), sense);
        if self.selectable && response.hovered() {
            ui.painter().rect_stroke(
                inner.response.rect,
                6.0,
                Stroke::new(1.5, Color32::from_rgb(200, 200, 255)),
            );
        }
        response
    }
}

fn hazard_type_color(kind: HazardType) -> Color32 {
    match kind {
        HazardType::Predator => Color32::from_rgb(230, 90, 80),
        HazardType::Rival => Color32::from_rgb(230, 170, 70),
        HazardType::Climate => Color32::from_rgb(110, 170, 240),
    }
}

impl SlotContent for DealtCard {
    fn slot_lines(&self) -> Vec<SlotLine> {
        let card = &self.card;
        let mut kind = format!("{:?}", card.hazard_type);
        if let Some(predator) = card.predator_type {
            kind = format!("{kind} ({predator:?})");
        }
        let mut lines = vec![
            vec![SlotFragment::plain(&card.name).strong().size(16.0)],
            vec![SlotFragment::plain(kind).color(hazard_type_color(card.hazard_type))],
            vec![
                SlotFragment::plain("Difficulty"),
                SlotFragment::plain(card.base_difficulty.to_string()).strong(),
            ],
        ];
        let stats: Vec<&str> = card.eligible_stats.iter().map(|s| s.display_name()).collect();
        lines.push(vec![SlotFragment::plain(stats.join(" / ")).color(Color32::LIGHT_GRAY)]);
        if let Some(cond) = card.empowerment_condition.as_ref().filter(|c| !c.terrain.is_empty()) {
            let terrains: Vec<String> = cond.terrain.iter().map(|t| format!("{t:?}")).collect();
            lines.push(vec![
                SlotFragment::plain("Empowered on").color(Color32::from_rgb(240, 140, 60)),
                SlotFragment::plain(terrains.join(", ")),
            ]);
        }
        if !card.description.is_empty() {
            lines.push(vec![SlotFragment::plain(&card.description).color(Color32::GRAY)]);
        }
        lines
    }
}

/// A stat the active player could roll against the active card.
pub struct StatOption {
    pub stat: StatKind,
    pub value: i32,
}

impl SlotContent for StatOption {
    fn slot_lines(&self) -> Vec<SlotLine> {
        vec![vec![
            SlotFragment::plain(self.stat.display_name()),
            SlotFragment::plain(self.value.to_string()).strong(),
        ]]
    }
}

impl SlotContent for Player {
    fn slot_lines(&self) -> Vec<SlotLine> {
        let pop_color = if self.current_population <= 1 {
            Color32::from_rgb(240, 90, 80)
        } else {
            Color32::WHITE
        };
        vec![
            vec![SlotFragment::plain(format!("Player {}", self.id)).strong()],
            vec![SlotFragment::plain(&self.species.display_name).size(15.0)],
            vec![
                SlotFragment::plain("Population"),
                SlotFragment::plain(format!("{}/{}", self.current_population, self.max_population))
                    .color(pop_color)
                    .strong(),
            ],
            vec![
                SlotFragment::plain("Evolution points"),
                SlotFragment::plain(self.evolution_points.to_string()).strong(),
            ],
        ]
    }
}

impl SlotContent for MigrationEventDef {
    fn slot_lines(&self) -> Vec<SlotLine> {
        let name = SlotFragment::plain(self.display_name()).strong();
        let name = if self.enabled {
            name
        } else {
            name.color(Color32::DARK_GRAY)
        };
        vec![vec![name]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{EmpowermentCondition, HazardCard};
    use crate::world::Terrain;

    fn text(lines: &[SlotLine]) -> String {
        lines
            .iter()
            .flat_map(|l| l.iter().map(|f| f.text.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_card_lines_name_difficulty_and_empowerment() {
        let dealt = DealtCard {
            id: 4,
            card: HazardCard {
                name: "Cave Bear".into(),
                hazard_type: HazardType::Predator,
                base_difficulty: 7,
                eligible_stats: vec![StatKind::Fight, StatKind::Flight],
                predator_type: None,
                empowerment_condition: Some(EmpowermentCondition {
                    terrain: vec![Terrain::Hills],
                }),
                description: String::new(),
            },
        };
        let lines = dealt.slot_lines();
        assert!(lines[0][0].strong);
        let all = text(&lines);
        assert!(all.contains("Cave Bear"));
        assert!(all.contains("7"));
        assert!(all.contains("Fight / Flight"));
        assert!(all.contains("Hills"));
    }

    #[test]
    fn test_card_without_condition_has_no_empowerment_line() {
        let dealt = DealtCard {
            id: 1,
            card: HazardCard {
                name: "Drought".into(),
                hazard_type: HazardType::Climate,
                base_difficulty: 5,
                eligible_stats: vec![StatKind::ClimateResistance],
                predator_type: None,
                empowerment_condition: None,
                description: String::new(),
            },
        };
        assert!(!text(&dealt.slot_lines()).contains("Empowered"));
    }
}
