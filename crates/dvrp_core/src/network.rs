//! Minimal link network: just enough to resolve link ids per mode and to
//! measure straight-line distances for facility selection.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::ids::{LinkId, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Coord) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub from: Coord,
    pub to: Coord,
    /// Modes allowed on this link. Empty means every mode.
    #[serde(default)]
    pub modes: BTreeSet<Mode>,
}

impl Link {
    pub fn new(id: impl Into<LinkId>, from: Coord, to: Coord) -> Self {
        Self {
            id: id.into(),
            from,
            to,
            modes: BTreeSet::new(),
        }
    }

    pub fn with_modes<I, M>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Mode>,
    {
        self.modes = modes.into_iter().map(Into::into).collect();
        self
    }

    /// Midpoint of the link; used as its location.
    pub fn coord(&self) -> Coord {
        Coord::new((self.from.x + self.to.x) / 2.0, (self.from.y + self.to.y) / 2.0)
    }

    pub fn length(&self) -> f64 {
        self.from.distance(&self.to)
    }

    pub fn allows(&self, mode: &Mode) -> bool {
        self.modes.is_empty() || self.modes.contains(mode)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    links: HashMap<LinkId, Link>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_links(links: impl IntoIterator<Item = Link>) -> Self {
        let mut network = Self::new();
        for link in links {
            network.add_link(link);
        }
        network
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let links: Vec<Link> = serde_json::from_str(json)?;
        Ok(Self::from_links(links))
    }

    pub fn add_link(&mut self, link: Link) {
        self.links.insert(link.id.clone(), link);
    }

    pub fn link(&self, id: &LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Sub-network containing only the links the given mode may use.
    pub fn filter_by_mode(&self, mode: &Mode) -> Network {
        Network {
            links: self
                .links
                .iter()
                .filter(|(_, link)| link.allows(mode))
                .map(|(id, link)| (id.clone(), link.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> Network {
        Network::from_links([
            Link::new("a", Coord::new(0.0, 0.0), Coord::new(100.0, 0.0)),
            Link::new("b", Coord::new(100.0, 0.0), Coord::new(100.0, 100.0)).with_modes(["car"]),
        ])
    }

    #[test]
    fn modal_filter_keeps_unrestricted_links() {
        let drt = network().filter_by_mode(&Mode::from("drt"));
        assert_eq!(drt.len(), 1);
        assert!(drt.link(&LinkId::from("a")).is_some());
        assert!(drt.link(&LinkId::from("b")).is_none());

        let car = network().filter_by_mode(&Mode::from("car"));
        assert_eq!(car.len(), 2);
    }

    #[test]
    fn link_coord_is_midpoint() {
        let net = network();
        let link = net.link(&LinkId::from("a")).expect("link a");
        assert_eq!(link.coord(), Coord::new(50.0, 0.0));
        assert_eq!(link.length(), 100.0);
    }

    #[test]
    fn network_loads_from_json() {
        let json = r#"[
            {"id": "l1", "from": {"x": 0.0, "y": 0.0}, "to": {"x": 1.0, "y": 0.0}},
            {"id": "l2", "from": {"x": 1.0, "y": 0.0}, "to": {"x": 2.0, "y": 0.0}, "modes": ["drt"]}
        ]"#;
        let net = Network::from_json_str(json).expect("valid network json");
        assert_eq!(net.len(), 2);
        assert!(net
            .link(&LinkId::from("l2"))
            .expect("l2")
            .allows(&Mode::from("drt")));
    }
}
