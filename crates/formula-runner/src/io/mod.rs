mod read_inputs;

pub use read_inputs::{
    load_template, load_variables, parse_inline_var, InputError, PricingTemplate,
};
