pub mod ebi_framework {
    pub mod activity_key;
    pub mod displayable;
    pub mod ebi_command;
    pub mod ebi_file_handler;
    pub mod ebi_input;
    pub mod ebi_output;
    pub mod ebi_trait;
    pub mod ebi_trait_object;
    pub mod exportable;
    pub mod importable;
    pub mod infoable;
    pub mod validate;
}
pub mod ebi_commands {
    pub mod ebi_command_align;
    pub mod ebi_command_info;
    pub mod ebi_command_validate;
}
pub mod ebi_objects {
    pub mod accepting_petri_net;
    pub mod alignments;
    pub mod event_log;
    pub mod event_log_csv;
}
pub mod ebi_traits {
    pub mod ebi_trait_event_log;
}
pub mod math {
    pub mod astar;
}
pub mod semantics {
    pub mod accepting_petri_net_semantics;
    pub mod semantics;
}
pub mod techniques {
    pub mod align;
    pub mod alignment_error;
    pub mod cost_function;
    pub mod marking_equation;
    pub mod synchronous_product;
}
pub mod line_reader;
pub mod marking;
pub mod multiple_reader;
