use sovran_outcome::{Error, OneOf3, Outcome, OutcomeError};

// A lookup that can answer with a name, a numeric id, or a flag
type Lookup = Outcome<OneOf3<String, u64, bool>>;

fn find(query: &str) -> Lookup {
    match query {
        "" => Lookup::from_error(Error::validation("query is empty")),
        "admin" => Lookup::from_value(true),
        q if q.chars().all(|c| c.is_ascii_digit()) => match q.parse::<u64>() {
            Ok(id) => Lookup::from_value(id),
            Err(e) => Lookup::from_exception(e),
        },
        "nobody" => Lookup::empty(),
        q => Lookup::from_value(q.to_uppercase()),
    }
}

fn main() -> Result<(), OutcomeError> {
    for query in ["alice", "42", "admin", "nobody", "", "99999999999999999999999"] {
        let mut outcome = find(query);

        // Exactly one branch runs per outcome
        outcome
            .matcher()
            .on::<String>(|name| println!("{query:?}: name {name}"))
            .on::<u64>(|id| println!("{query:?}: id {id}"))
            .on::<bool>(|flag| println!("{query:?}: flag {flag}"))
            .no_result(|| println!("{query:?}: nothing found"))
            .errors(|errors| println!("{query:?}: {} error(s), first: {}", errors.len(), errors[0]))
            .exception(|e| println!("{query:?}: failed with {} ({})", e.message(), e.type_name()))
            .run();

        // Or map every declared type into one common type
        let summary = outcome
            .try_map(|name: &String| format!("text({})", name.len()))
            .try_map(|id: &u64| format!("number({id})"))
            .try_map(|flag: &bool| format!("flag({flag})"))
            .take_matched_as::<String>()
            .unwrap_or_else(|| "-".to_string());
        println!("    summary: {summary}");

        println!("    wire: {}", outcome.to_json()?);
    }

    Ok(())
}
