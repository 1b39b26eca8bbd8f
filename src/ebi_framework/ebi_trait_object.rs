use anyhow::Result;

use crate::{
    ebi_framework::{ebi_trait::EbiTrait, infoable::Infoable},
    ebi_objects::accepting_petri_net::AcceptingPetriNet,
    ebi_traits::ebi_trait_event_log::EbiTraitEventLog,
};

pub enum EbiTraitObject {
    AcceptingPetriNet(AcceptingPetriNet),
    EventLog(Box<dyn EbiTraitEventLog>),
}

impl EbiTraitObject {
    pub fn get_trait(&self) -> EbiTrait {
        match self {
            EbiTraitObject::AcceptingPetriNet(_) => EbiTrait::AcceptingPetriNet,
            EbiTraitObject::EventLog(_) => EbiTrait::EventLog,
        }
    }
}

impl Infoable for EbiTraitObject {
    fn info(&self, f: &mut dyn std::io::Write) -> Result<()> {
        match self {
            EbiTraitObject::AcceptingPetriNet(net) => net.info(f),
            EbiTraitObject::EventLog(log) => log.info(f),
        }
    }
}
