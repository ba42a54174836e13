use oasref_core::{resolve_document, AppError, DocumentLoader, FsLoader, OpenApi};
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn test_resolve_from_directory_tree() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("schemas")).unwrap();
    fs::create_dir_all(root.join("responses")).unwrap();

    fs::write(
        root.join("schemas/pet.yaml"),
        r#"
Pet:
  type: object
  required: [id]
  properties:
    id:
      type: integer
    owner:
      $ref: './owner.yaml'
"#,
    )
    .unwrap();
    fs::write(
        root.join("schemas/owner.yaml"),
        "type: object\nproperties:\n  name:\n    type: string\n",
    )
    .unwrap();
    fs::write(
        root.join("responses/errors.yaml"),
        r#"
NotFound:
  description: not found
  content:
    application/json:
      schema:
        $ref: '../schemas/pet.yaml#/Pet'
"#,
    )
    .unwrap();

    let main = root.join("openapi.yaml");
    fs::write(
        &main,
        r#"
openapi: 3.0.3
info:
  title: Pets
  version: "1.0"
paths:
  /pets/{id}:
    get:
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: './schemas/pet.yaml#/Pet'
        "404":
          $ref: './responses/errors.yaml#/NotFound'
"#,
    )
    .unwrap();

    let mut openapi = OpenApi::from_yaml_str(&fs::read_to_string(&main).unwrap()).unwrap();
    let parent = main.to_string_lossy().to_string();
    assert!(resolve_document(Some(&mut openapi), &FsLoader, Some(&parent)).unwrap());

    let schemas: Vec<&str> = openapi
        .components
        .schemas
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(schemas, vec!["Pet", "owner"]);
    assert!(openapi.components.responses.contains_key("NotFound"));

    let rendered = openapi.to_yaml_string().unwrap();
    assert!(!rendered.contains(".yaml"), "external refs left: {}", rendered);
    assert!(rendered.contains("#/components/schemas/owner"));
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");
    let err = FsLoader
        .load(&missing.to_string_lossy(), &[])
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn test_unparsable_external_document_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.yaml"), "Pet: [unclosed").unwrap();
    let main = dir.path().join("openapi.yaml");

    let mut openapi = OpenApi::from_yaml_str(
        r#"
openapi: 3.0.3
components:
  schemas:
    Holder:
      properties:
        pet:
          $ref: './broken.yaml#/Pet'
"#,
    )
    .unwrap();
    let parent = main.to_string_lossy().to_string();
    let result = resolve_document(Some(&mut openapi), &FsLoader, Some(&parent));
    assert!(matches!(result, Err(AppError::Parse(_))));
}
