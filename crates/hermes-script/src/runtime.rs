//! The fixed part of every generated module.
//!
//! `invoke` walks a route descriptor the way `hermes_client::build_request`
//! and `read_reply` walk a compiled route. The text codecs mirror
//! `hermes_core::wire`.

/// Error classes, text codecs and the generic `invoke`.
pub(crate) const RUNTIME: &str = r#"class InterfaceMismatchError extends Error {
  constructor(method, detail) {
    super(`interface mismatch on ${method}: ${detail}`);
    this.name = "InterfaceMismatchError";
    this.method = method;
    this.detail = detail;
  }
}

class HermesHttpError extends Error {
  constructor(status, envelope) {
    super(`server responded ${status}: ${envelope.error.message}`);
    this.name = "HermesHttpError";
    this.status = status;
    this.envelope = envelope;
  }
}

function kindOf(value) {
  if (value === null) return "null";
  if (Array.isArray(value)) return "array";
  return typeof value;
}

function checkValue(type, value) {
  switch (type) {
    case "json":
      return value !== null;
    case "string":
      return typeof value === "string";
    case "boolean":
      return typeof value === "boolean";
    case "integer":
      return Number.isInteger(value);
    case "float":
      return typeof value === "number" && Number.isFinite(value);
    default:
      return false;
  }
}

function encodeError(id, name, reason) {
  return new TypeError(`cannot encode argument \`${name}\` of ${id}: ${reason}`);
}

function checkArgument(id, name, type, value) {
  if (!checkValue(type, value)) {
    throw encodeError(id, name, `expected ${type}, found ${kindOf(value)}`);
  }
}

function toWire(id, name, type, value) {
  checkArgument(id, name, type, value);
  return type === "json" ? JSON.stringify(value) : String(value);
}

function fromWire(type, text) {
  switch (type) {
    case "string":
      return text;
    case "integer":
    case "float": {
      const n = Number(text.trim());
      if (text.trim() === "" || Number.isNaN(n)) {
        throw new TypeError(`cannot parse \`${text}\` as ${type}`);
      }
      return n;
    }
    case "boolean":
      if (text.trim() === "true") return true;
      if (text.trim() === "false") return false;
      throw new TypeError(`cannot parse \`${text}\` as boolean`);
    default:
      return JSON.parse(text);
  }
}

function joinUrl(base, path) {
  if (!base) return path;
  if (base.endsWith("/") && path.startsWith("/")) return base + path.slice(1);
  if (!base.endsWith("/") && !path.startsWith("/")) return `${base}/${path}`;
  return base + path;
}

async function invoke(baseUrl, options, route, args) {
  args = args || {};
  const present = (name) => args[name] !== undefined && args[name] !== null;
  const known = new Set(route.path.filter((p) => typeof p !== "string").map((p) => p.name));
  for (const f of [...route.query, ...route.headers, ...route.body]) known.add(f.name);
  for (const name of Object.keys(args)) {
    if (!known.has(name)) throw new TypeError(`${route.id} takes no argument \`${name}\``);
  }
  for (const f of [...route.query, ...route.headers, ...route.body]) {
    if (f.required && !present(f.name)) {
      throw new TypeError(`${route.id} requires argument \`${f.name}\``);
    }
  }

  let path = "";
  for (const piece of route.path) {
    if (typeof piece === "string") {
      path += piece;
    } else if (present(piece.name)) {
      const text = toWire(route.id, piece.name, piece.type, args[piece.name]);
      if (text === "") throw encodeError(route.id, piece.name, "path segments cannot be empty");
      path += encodeURIComponent(text);
    } else {
      throw new TypeError(`${route.id} requires argument \`${piece.name}\``);
    }
  }

  const query = new URLSearchParams();
  for (const f of route.query) {
    if (present(f.name)) query.append(f.field, toWire(route.id, f.name, f.type, args[f.name]));
  }

  const headers = { ...(options.headers || {}) };
  for (const f of route.headers) {
    if (present(f.name)) headers[f.field] = toWire(route.id, f.name, f.type, args[f.name]);
  }

  let body;
  if (route.body.length > 0) {
    const object = {};
    for (const f of route.body) {
      if (present(f.name)) {
        checkArgument(route.id, f.name, f.type, args[f.name]);
        object[f.field] = args[f.name];
      }
    }
    body = JSON.stringify(object);
    headers["content-type"] = "application/json";
  }

  const search = query.toString();
  const url = joinUrl(baseUrl, path) + (search ? `?${search}` : "");
  const init = { method: route.method, headers, body };
  if (options.timeoutMs !== undefined) init.signal = AbortSignal.timeout(options.timeoutMs);
  const send = options.fetch || globalThis.fetch.bind(globalThis);
  const response = await send(url, init);

  if (!response.ok) {
    const text = await response.text();
    let envelope = null;
    try {
      envelope = JSON.parse(text);
    } catch (_) {
      envelope = null;
    }
    if (!envelope || typeof envelope.error !== "object") {
      const code = response.status >= 500 ? "SERVER_ERROR" : "CLIENT_ERROR";
      envelope = { error: { code, message: text, status: response.status } };
    }
    throw new HermesHttpError(response.status, envelope);
  }

  const outputs = {};
  for (const f of route.outputs) {
    const raw = response.headers.get(f.field);
    if (raw === null) {
      if (f.required) {
        throw new InterfaceMismatchError(route.id, `missing required response header \`${f.field}\``);
      }
      outputs[f.name] = f.default === undefined ? null : f.default;
    } else {
      try {
        outputs[f.name] = fromWire(f.type, raw);
      } catch (e) {
        throw new InterfaceMismatchError(route.id, `header \`${f.field}\`: ${e.message}`);
      }
    }
  }

  let value = null;
  if (route.returns !== null && route.method !== "HEAD") {
    const text = await response.text();
    value = route.text ? text : JSON.parse(text);
  }
  return { status: response.status, value, outputs };
}"#;

/// Names the runtime defines for export.
pub(crate) const RUNTIME_EXPORTS: [&str; 2] = ["InterfaceMismatchError", "HermesHttpError"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_defines_exports() {
        for name in RUNTIME_EXPORTS {
            assert!(RUNTIME.contains(&format!("class {name} extends Error")));
        }
        assert!(RUNTIME.contains("async function invoke(baseUrl, options, route, args)"));
    }

    #[test]
    fn test_runtime_checks_arguments_like_the_rust_client() {
        for ty in ["\"string\"", "\"integer\"", "\"float\"", "\"boolean\"", "\"json\""] {
            assert!(RUNTIME.contains(&format!("case {ty}:")), "{ty}");
        }
        assert!(RUNTIME.contains("checkArgument(route.id, f.name, f.type, args[f.name]);"));
        assert!(RUNTIME.contains("path segments cannot be empty"));
    }

    #[test]
    fn test_runtime_has_no_module_syntax() {
        assert!(!RUNTIME.contains("export "));
        assert!(!RUNTIME.contains("module.exports"));
    }
}
