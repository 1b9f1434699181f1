//! Writing and reading export archives.
//!
//! An export archive is a zip file with `agent.json` and `package.json` at
//! the root, intent definitions and usersays under `intents/`, and entity
//! definitions and entries under `entities/`. The same layout the remote
//! platform produces on export is accepted back on import, so exporting and
//! re-importing an agent yields an equivalent model.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::ApiError;
use crate::export::render::{
    message_to_response, render_agent, render_entity, render_entity_entries, render_intent,
    render_usersays_for_intent, ExportOptions,
};
use crate::export::schema::{
    AgentFile, EntityEntryFile, EntityFile, IntentFile, PackageFile, UsersaysFile,
};
use crate::language::{
    AgentResources, ExampleUtterance, IntentLanguageData, LanguageCode, ResponseGroup,
    UtteranceChunk,
};
use crate::model::{
    event_name, AgentDefinition, Context, CustomEntity, EntityEntry, EntityRef, Intent, Parameter,
};

/// Serialize the agent and its language resources into a zip archive.
pub fn export_to_writer<W: Write + Seek>(
    agent: &AgentDefinition,
    resources: &AgentResources,
    options: &ExportOptions,
    writer: W,
) -> Result<(), ApiError> {
    let mut zip = ZipWriter::new(writer);
    let file_options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    write_json(&mut zip, "agent.json", &render_agent(agent), file_options)?;
    write_json(&mut zip, "package.json", &PackageFile::default(), file_options)?;

    for intent in agent.intents() {
        let empty = IntentLanguageData::default();
        let language_data: Vec<(LanguageCode, &IntentLanguageData)> = agent
            .languages()
            .iter()
            .map(|&code| {
                (
                    code,
                    resources.intent_data(&intent.name, code).unwrap_or(&empty),
                )
            })
            .collect();

        let rendered = render_intent(intent, &language_data, options);
        write_json(
            &mut zip,
            &format!("intents/{}.json", intent.name),
            &rendered,
            file_options,
        )?;

        for (code, data) in &language_data {
            let usersays = render_usersays_for_intent(intent, data, *code);
            write_json(
                &mut zip,
                &format!("intents/{}_usersays_{}.json", intent.name, code.as_str()),
                &usersays,
                file_options,
            )?;
        }
    }

    for entity in agent.entities() {
        write_json(
            &mut zip,
            &format!("entities/{}.json", entity.name),
            &render_entity(entity),
            file_options,
        )?;
        for &code in agent.languages() {
            let entries = resources.entity_entries(&entity.name, code).unwrap_or(&[]);
            write_json(
                &mut zip,
                &format!("entities/{}_entries_{}.json", entity.name, code.as_str()),
                &render_entity_entries(entries),
                file_options,
            )?;
        }
    }

    zip.finish()?;
    info!(agent = %agent.name(), "exported agent archive");
    Ok(())
}

fn write_json<W: Write + Seek, T: serde::Serialize>(
    zip: &mut ZipWriter<W>,
    name: &str,
    value: &T,
    options: FileOptions,
) -> Result<(), ApiError> {
    debug!(file = %name, "writing archive entry");
    zip.start_file(name, options)?;
    let json = serde_json::to_vec_pretty(value)?;
    zip.write_all(&json)?;
    Ok(())
}

/// Export to a `.zip` file on disk.
pub fn export_to_file(
    agent: &AgentDefinition,
    resources: &AgentResources,
    options: &ExportOptions,
    path: &Path,
) -> Result<(), ApiError> {
    let file = File::create(path)?;
    export_to_writer(agent, resources, options, file)
}

/// Export to an in-memory buffer, e.g. for upload.
pub fn export_to_vec(
    agent: &AgentDefinition,
    resources: &AgentResources,
    options: &ExportOptions,
) -> Result<Vec<u8>, ApiError> {
    let mut buffer = Cursor::new(Vec::new());
    export_to_writer(agent, resources, options, &mut buffer)?;
    Ok(buffer.into_inner())
}

/// Read an export archive back into a definition and its resources.
pub fn import_from_reader<R: Read + Seek>(
    reader: R,
) -> Result<(AgentDefinition, AgentResources), ApiError> {
    let mut zip = ZipArchive::new(reader)?;

    let agent_file: AgentFile = read_json(&mut zip, "agent.json")?;
    let mut languages = vec![LanguageCode::from_str(&agent_file.language)?];
    for code in &agent_file.supported_languages {
        languages.push(LanguageCode::from_str(code)?);
    }

    let mut agent = AgentDefinition::new(agent_file.display_name);
    agent.set_languages(languages);
    let mut resources = AgentResources::new();

    // Two passes over the archive listing: definitions first, so entities
    // exist before intents referencing them are registered.
    let names: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).map(|f| f.name().to_string()))
        .collect::<Result<_, _>>()?;

    for name in &names {
        if let Some(entity_name) = entity_definition_name(name) {
            let file: EntityFile = read_json(&mut zip, name)?;
            agent.register_entity(CustomEntity {
                name: entity_name.to_string(),
                use_synonyms: !file.is_enum,
                regexp_entity: file.is_regexp,
                automated_expansion: file.automated_expansion,
                fuzzy_matching: file.allow_fuzzy_extraction,
            })?;
        }
    }

    let mut intent_bundles: HashMap<(String, LanguageCode), IntentLanguageData> = HashMap::new();

    for name in &names {
        if let Some(intent_name) = intent_definition_name(name) {
            let file: IntentFile = read_json(&mut zip, name)?;
            let (intent, prompts) = import_intent(intent_name, &file)?;
            for ((param, code), values) in prompts {
                intent_bundles
                    .entry((intent.name.clone(), code))
                    .or_default()
                    .slot_filling_prompts
                    .insert(param, values);
            }
            import_intent_messages(&file, &mut intent_bundles, &intent.name)?;
            agent.register_intent(intent)?;
        }
    }

    // Input-only contexts appear in intent files as bare names, without a
    // lifespan. Restore them with the default lifespan so the imported
    // agent passes the same integrity checks the exported one did.
    let input_contexts: Vec<String> = agent
        .intents()
        .iter()
        .flat_map(|intent| intent.input_contexts.iter().cloned())
        .collect();
    for context_name in input_contexts {
        if agent.context_by_name(&context_name).is_none() {
            agent.register_context(Context::with_default_lifespan(context_name))?;
        }
    }

    for name in &names {
        if let Some((intent_name, code)) = usersays_name(name) {
            let files: Vec<UsersaysFile> = read_json(&mut zip, name)?;
            let bundle = intent_bundles
                .entry((intent_name.to_string(), code))
                .or_default();
            for file in files {
                let chunks = file
                    .data
                    .into_iter()
                    .map(|chunk| match (chunk.meta, chunk.alias) {
                        (Some(_), Some(alias)) => UtteranceChunk::Entity {
                            parameter_name: alias,
                            sample_value: chunk.text,
                        },
                        _ => UtteranceChunk::Text { text: chunk.text },
                    })
                    .collect();
                bundle
                    .example_utterances
                    .push(ExampleUtterance::from_chunks(chunks));
            }
        } else if let Some((entity_name, code)) = entity_entries_name(name) {
            let files: Vec<EntityEntryFile> = read_json(&mut zip, name)?;
            let entries = files
                .into_iter()
                .map(|entry| EntityEntry::new(entry.value, entry.synonyms))
                .collect();
            resources.insert_entity(entity_name.to_string(), code, entries);
        }
    }

    for ((intent_name, code), bundle) in intent_bundles {
        resources.insert_intent(intent_name, code, bundle);
    }

    info!(agent = %agent.name(), intents = agent.intents().len(), "imported agent archive");
    Ok((agent, resources))
}

/// Import a `.zip` file from disk.
pub fn import_from_file(path: &Path) -> Result<(AgentDefinition, AgentResources), ApiError> {
    let file = File::open(path)?;
    import_from_reader(file)
}

fn read_json<R: Read + Seek, T: serde::de::DeserializeOwned>(
    zip: &mut ZipArchive<R>,
    name: &str,
) -> Result<T, ApiError> {
    let mut file = zip.by_name(name).map_err(|_| {
        ApiError::ExportError(format!("Archive is missing expected file: {}", name))
    })?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    serde_json::from_str(&content)
        .map_err(|e| ApiError::ExportError(format!("Failed to parse {}: {}", name, e)))
}

type PromptMap = HashMap<(String, LanguageCode), Vec<String>>;

fn import_intent(name: &str, file: &IntentFile) -> Result<(Intent, PromptMap), ApiError> {
    let mut intent = Intent::new(name);
    intent.input_contexts = file.contexts.clone();

    let mut prompts: PromptMap = HashMap::new();

    if let Some(response) = file.responses.first() {
        intent.output_contexts = response
            .affected_contexts
            .iter()
            .map(|ctx| Context::new(ctx.name.clone(), ctx.lifespan))
            .collect();

        for param_file in &response.parameters {
            let entity_name = param_file
                .data_type
                .strip_prefix('@')
                .unwrap_or(&param_file.data_type);
            let entity = EntityRef::try_from(entity_name.to_string())?;
            let mut param = Parameter::new(param_file.name.clone(), entity);
            param.is_list = param_file.is_list;
            if !param_file.required && !param_file.default_value.is_empty() {
                param.default = Some(param_file.default_value.clone());
            }
            for prompt in &param_file.prompts {
                let code = LanguageCode::from_str(&prompt.lang)?;
                prompts
                    .entry((param_file.name.clone(), code))
                    .or_default()
                    .push(prompt.value.clone());
            }
            intent.parameters.push(param);
        }
    }

    let derived = event_name(name);
    intent.events = file
        .events
        .iter()
        .filter(|event| event.name != derived)
        .map(|event| event.name.clone())
        .collect();

    Ok((intent, prompts))
}

fn import_intent_messages(
    file: &IntentFile,
    bundles: &mut HashMap<(String, LanguageCode), IntentLanguageData>,
    intent_name: &str,
) -> Result<(), ApiError> {
    let Some(response) = file.responses.first() else {
        return Ok(());
    };

    // Rich messages are duplicated per platform on export; keep only the
    // first platform's copy to restore the original message list.
    let first_platform = response
        .messages
        .iter()
        .find_map(|message| message.platform.clone());

    for message in &response.messages {
        let code = LanguageCode::from_str(&message.lang)?;
        let group = if message.platform.is_some() {
            if message.platform != first_platform {
                continue;
            }
            ResponseGroup::Rich
        } else {
            ResponseGroup::Default
        };
        let Some(decoded) = message_to_response(message)? else {
            continue;
        };
        bundles
            .entry((intent_name.to_string(), code))
            .or_default()
            .responses
            .entry(group)
            .or_default()
            .push(decoded);
    }
    Ok(())
}

fn intent_definition_name(path: &str) -> Option<&str> {
    let stem = path.strip_prefix("intents/")?.strip_suffix(".json")?;
    if stem.contains("_usersays_") {
        return None;
    }
    Some(stem)
}

fn usersays_name(path: &str) -> Option<(&str, LanguageCode)> {
    let stem = path.strip_prefix("intents/")?.strip_suffix(".json")?;
    let (intent_name, lang) = stem.split_once("_usersays_")?;
    Some((intent_name, LanguageCode::from_str(lang).ok()?))
}

fn entity_definition_name(path: &str) -> Option<&str> {
    let stem = path.strip_prefix("entities/")?.strip_suffix(".json")?;
    if stem.contains("_entries_") {
        return None;
    }
    Some(stem)
}

fn entity_entries_name(path: &str) -> Option<(&str, LanguageCode)> {
    let stem = path.strip_prefix("entities/")?.strip_suffix(".json")?;
    let (entity_name, lang) = stem.split_once("_entries_")?;
    Some((entity_name, LanguageCode::from_str(lang).ok()?))
}
